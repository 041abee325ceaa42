//! Best score storage
//!
//! `MemoryStore` keeps the best score and the leaderboard for the lifetime of
//! the process. Clones share the same storage, so a driver can keep a handle
//! after moving one into the state machine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::highscores::HighScores;
use crate::platform::PersistenceProvider;
use crate::sim::state::RunSummary;

#[derive(Debug, Default)]
struct Stored {
    best_score: u64,
    saves: u32,
    high_scores: HighScores,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Stored>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing best score
    pub fn with_best_score(best_score: u64) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().best_score = best_score;
        store
    }

    pub fn best_score(&self) -> u64 {
        self.inner.borrow().best_score
    }

    /// Number of `save_score` calls
    pub fn saves(&self) -> u32 {
        self.inner.borrow().saves
    }

    pub fn high_scores(&self) -> HighScores {
        self.inner.borrow().high_scores.clone()
    }
}

impl PersistenceProvider for MemoryStore {
    fn load_best_score(&mut self) -> u64 {
        self.best_score()
    }

    fn save_score(&mut self, score: u64) {
        let mut stored = self.inner.borrow_mut();
        stored.saves += 1;
        if score > stored.best_score {
            stored.best_score = score;
            log::debug!("MemoryStore: best score now {}", score);
        }
    }

    fn record_run(&mut self, summary: &RunSummary) {
        if let Some(rank) = self.inner.borrow_mut().high_scores.add_run(summary) {
            log::info!("MemoryStore: run placed #{} on the leaderboard", rank);
        }
    }
}
