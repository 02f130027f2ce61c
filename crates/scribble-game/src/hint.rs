//! Progressive letter reveal for the secret word.

use rand::Rng;
use rand::seq::IteratorRandom;

/// Placeholder shown for a letter that has not been revealed yet.
pub const PLACEHOLDER: char = '_';

/// The secret word plus which of its letters guessers can already see.
///
/// Whitespace is never masked and never counts as a letter. Reveals only
/// ever turn placeholders into letters, so the number of visible letters
/// never goes down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    letters: Vec<char>,
    revealed: Vec<bool>,
}

impl Hint {
    /// Starts with every letter masked.
    pub fn new(word: &str) -> Self {
        let letters: Vec<char> = word.chars().collect();
        let revealed = letters.iter().map(|c| c.is_whitespace()).collect();
        Self { letters, revealed }
    }

    pub fn word(&self) -> String {
        self.letters.iter().collect()
    }

    /// Number of non-whitespace characters.
    pub fn letter_count(&self) -> usize {
        self.letters.iter().filter(|c| !c.is_whitespace()).count()
    }

    /// Number of letters guessers can currently see.
    pub fn revealed_count(&self) -> usize {
        self.letters
            .iter()
            .zip(&self.revealed)
            .filter(|(c, shown)| **shown && !c.is_whitespace())
            .count()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed.iter().all(|shown| *shown)
    }

    /// The word with every hidden letter replaced by [`PLACEHOLDER`].
    pub fn masked(&self) -> String {
        self.letters
            .iter()
            .zip(&self.revealed)
            .map(|(c, shown)| if *shown { *c } else { PLACEHOLDER })
            .collect()
    }

    /// The mask spaced out for display, annotated with the letter count:
    /// `"c _ _   _ _ _ (6)"` for a half-hinted `"cat dog"`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in self.masked().chars() {
            if c.is_whitespace() {
                out.push_str("  ");
            } else {
                out.push(c);
                out.push(' ');
            }
        }
        format!("{}({})", out, self.letter_count())
    }

    /// Unmasks one still-hidden letter chosen uniformly at random.
    ///
    /// Returns `false` (and changes nothing) once the word is fully
    /// exposed. Picking only among hidden positions means every call that
    /// returns `true` reveals a net-new letter.
    pub fn reveal_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let hidden = self
            .revealed
            .iter()
            .enumerate()
            .filter(|(_, shown)| !**shown)
            .map(|(i, _)| i)
            .choose(rng);
        match hidden {
            Some(i) => {
                self.revealed[i] = true;
                true
            }
            None => false,
        }
    }

    /// Applies up to `n` successive reveals and returns how many letters
    /// were actually uncovered.
    pub fn reveal_n<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> usize {
        (0..n).take_while(|_| self.reveal_one(rng)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5c21bb1e)
    }

    #[test]
    fn test_new_masks_letters_keeps_spaces() {
        let hint = Hint::new("ice cream");
        assert_eq!(hint.masked(), "___ _____");
        assert_eq!(hint.letter_count(), 8);
        assert_eq!(hint.revealed_count(), 0);
    }

    #[test]
    fn test_render_spaces_out_and_annotates_length() {
        let hint = Hint::new("ab c");
        assert_eq!(hint.render(), "_ _   _ (3)");
    }

    #[test]
    fn test_reveal_is_monotonic_and_reaches_full_reveal() {
        let mut hint = Hint::new("hot air balloon");
        let mut rng = rng();
        let letters = hint.letter_count();
        let mut previous = hint.masked();

        for step in 1..=letters {
            assert!(hint.reveal_one(&mut rng), "reveal {step} should uncover a letter");
            assert_eq!(hint.revealed_count(), step);
            let current = hint.masked();
            // Every previously visible letter is still visible.
            for (before, after) in previous.chars().zip(current.chars()) {
                if before != PLACEHOLDER {
                    assert_eq!(before, after);
                }
            }
            previous = current;
        }

        assert!(hint.is_fully_revealed());
        assert_eq!(hint.masked(), "hot air balloon");
        assert!(!hint.reveal_one(&mut rng));
    }

    #[test]
    fn test_reveal_n_applies_every_requested_hint() {
        // A zero-iteration bound (counting from n up to n) would return the
        // mask untouched. Progressive reveal is the behavior relied on, so
        // n reveals must uncover exactly n letters.
        let mut hint = Hint::new("giraffe");
        let mut rng = rng();
        assert_eq!(hint.reveal_n(3, &mut rng), 3);
        assert_eq!(hint.revealed_count(), 3);
        assert_ne!(hint.masked(), "_______");
    }

    #[test]
    fn test_reveal_n_stops_at_full_reveal() {
        let mut hint = Hint::new("ox");
        let mut rng = rng();
        assert_eq!(hint.reveal_n(5, &mut rng), 2);
        assert!(hint.is_fully_revealed());
    }

    #[test]
    fn test_word_of_only_spaces_is_already_revealed() {
        let mut hint = Hint::new("  ");
        assert!(hint.is_fully_revealed());
        assert_eq!(hint.letter_count(), 0);
        assert!(!hint.reveal_one(&mut rng()));
    }
}
