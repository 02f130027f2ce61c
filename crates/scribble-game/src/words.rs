//! The word bank a lobby draws secret words from.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// An ordered list of candidate words. Duplicates are allowed and make a
/// word proportionally more likely to be picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bank = Self::new();
        bank.add_all(words);
        bank
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Replaces the whole bank.
    pub fn set<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.clear();
        self.add_all(words);
    }

    /// Appends one word. Blank words are ignored.
    pub fn add(&mut self, word: impl Into<String>) -> bool {
        let word = word.into();
        let word = word.trim();
        if word.is_empty() {
            return false;
        }
        self.words.push(word.to_owned());
        true
    }

    /// Appends every word, returning how many were added.
    pub fn add_all<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for word in words {
            if self.add(word) {
                added += 1;
            }
        }
        added
    }

    /// Removes the first case-insensitive match of `word`.
    pub fn remove(&mut self, word: &str) -> bool {
        match self.words.iter().position(|w| same_word(w, word)) {
            Some(index) => {
                self.words.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every case-insensitive occurrence of each given word,
    /// returning how many entries were dropped.
    pub fn remove_all<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        let before = self.words.len();
        self.words
            .retain(|w| !targets.contains(&w.to_lowercase()));
        before - self.words.len()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Picks a word uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }
}

fn same_word(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_add_keeps_order_and_duplicates() {
        let mut bank = WordBank::new();
        bank.add("cat");
        bank.add("dog");
        bank.add("cat");
        assert_eq!(bank.words(), ["cat", "dog", "cat"]);
    }

    #[test]
    fn test_add_ignores_blank() {
        let mut bank = WordBank::new();
        assert!(!bank.add("   "));
        assert!(bank.add("  fire truck "));
        assert_eq!(bank.words(), ["fire truck"]);
    }

    #[test]
    fn test_set_replaces_everything() {
        let mut bank = WordBank::from_words(["a", "b"]);
        bank.set(["x", "y", "z"]);
        assert_eq!(bank.words(), ["x", "y", "z"]);
    }

    #[test]
    fn test_remove_first_match_case_insensitive() {
        let mut bank = WordBank::from_words(["Cat", "dog", "cat"]);
        assert!(bank.remove("CAT"));
        assert_eq!(bank.words(), ["dog", "cat"]);
        assert!(!bank.remove("bird"));
    }

    #[test]
    fn test_remove_all_drops_every_occurrence() {
        let mut bank = WordBank::from_words(["cat", "dog", "Cat", "bird", "DOG"]);
        let removed = bank.remove_all(["cat", "dog"]);
        assert_eq!(removed, 4);
        assert_eq!(bank.words(), ["bird"]);
    }

    #[test]
    fn test_clear() {
        let mut bank = WordBank::from_words(["a", "b"]);
        bank.clear();
        assert!(bank.is_empty());
    }

    #[test]
    fn test_choose_returns_member() {
        let bank = WordBank::from_words(["apple", "pear"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let word = bank.choose(&mut rng).unwrap();
            assert!(word == "apple" || word == "pear");
        }
        assert!(WordBank::new().choose(&mut rng).is_none());
    }
}
