//! The artist queue: who draws, in what order, and whose turn it is.

use std::sync::Arc;

use scribble_presence::Presence;

/// Ordered artists plus a cursor pointing at the one currently drawing.
///
/// The cursor is always in range while the queue is non-empty and is 0
/// when it is empty. Cloning is cheap (a `Vec` of `Arc`s); the paint relay
/// publishes a clone after every change so readers never touch the live
/// queue.
#[derive(Debug, Clone, Default)]
pub struct ArtistQueue {
    artists: Vec<Arc<Presence>>,
    current: usize,
}

impl ArtistQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Arc<Presence>> {
        self.artists.get(self.current)
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current().is_some_and(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Presence>> {
        self.artists.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.artists.iter().map(|p| p.name().to_owned()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.artists.iter().position(|p| p.name() == name)
    }

    /// Appends an artist. A name already queued is not added twice.
    pub fn push(&mut self, artist: Arc<Presence>) -> bool {
        if self.position(artist.name()).is_some() {
            return false;
        }
        self.artists.push(artist);
        true
    }

    /// Removes an artist by name.
    ///
    /// Returns `Some(true)` if the removed artist held the cursor. In that
    /// case the cursor now points at the next artist in line (wrapping to
    /// the front), so there is never a turn without an artist while anyone
    /// is left. Removing someone before the cursor shifts it down so it
    /// keeps pointing at the same artist.
    pub fn remove(&mut self, name: &str) -> Option<bool> {
        let index = self.position(name)?;
        self.artists.remove(index);
        let was_current = index == self.current;
        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.artists.len() {
            self.current = 0;
        }
        Some(was_current)
    }

    /// Moves the cursor to the next artist, wrapping past the end.
    pub fn advance(&mut self) -> Option<&Arc<Presence>> {
        if self.artists.is_empty() {
            self.current = 0;
            return None;
        }
        self.current = (self.current + 1) % self.artists.len();
        self.current()
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Points the cursor at a named artist. Returns `false` if absent.
    pub fn set_current(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Scores sorted best first, ties broken by name.
    pub fn standings(&self) -> Vec<(String, u32)> {
        let mut board: Vec<(String, u32)> = self
            .artists
            .iter()
            .map(|p| (p.name().to_owned(), p.score()))
            .collect();
        board.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        board
    }
}
