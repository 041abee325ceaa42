//! High score leaderboard
//!
//! Keeps the top 10 finished runs, best first.

use serde::{Deserialize, Serialize};

use crate::sim::state::{RunOutcome, RunSummary};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level reached
    pub level: u32,
    pub rounds_completed: u32,
    pub outcome: RunOutcome,
}

impl From<&RunSummary> for HighScoreEntry {
    fn from(summary: &RunSummary) -> Self {
        Self {
            score: summary.score,
            level: summary.level,
            rounds_completed: summary.rounds_completed,
            outcome: summary.outcome,
        }
    }
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a finished run. Returns the rank achieved (1-indexed) or None.
    pub fn add_run(&mut self, summary: &RunSummary) -> Option<usize> {
        self.add_entry(HighScoreEntry::from(summary))
    }

    pub fn add_entry(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Sorted descending; ties keep the older entry first
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let scores: HighScores = serde_json::from_str(json)?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(score: u64) -> RunSummary {
        RunSummary {
            outcome: RunOutcome::Defeat,
            level: 2,
            round: 1,
            score,
            best_score: score,
            levels_completed: 1,
            rounds_completed: 4,
            perfect_levels: 0,
        }
    }

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!HighScores::new().qualifies(0));
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_run(&run(500)), Some(1));
        assert_eq!(scores.add_run(&run(1500)), Some(1));
        assert_eq!(scores.add_run(&run(1000)), Some(2));
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![1500, 1000, 500]);
        assert_eq!(scores.top_score(), Some(1500));
    }

    #[test]
    fn test_full_board_rejects_low_scores() {
        let mut scores = HighScores::new();
        for i in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_run(&run(i * 100));
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.potential_rank(100), None);
        assert_eq!(scores.add_run(&run(50)), None);
        assert_eq!(scores.potential_rank(550), Some(6));
        assert_eq!(scores.add_run(&run(5000)), Some(1));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(200));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut scores = HighScores::new();
        scores.add_run(&run(700));
        let back = HighScores::from_json(&scores.to_json().unwrap()).unwrap();
        assert_eq!(back.entries, scores.entries);
    }
}
