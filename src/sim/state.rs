//! Progression state types
//!
//! Snapshots of these are handed to collaborators with every notification.

use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyParameterSet;

/// One level of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// 1-based
    pub number: u32,
    pub total_rounds: u32,
    /// Difficulty scalar: `base + (number - 1) * increment`
    pub difficulty: f32,
    pub params: DifficultyParameterSet,
    /// Real clock
    pub started_at: f64,
    pub ended_at: Option<f64>,
    pub completed: bool,
}

impl Level {
    pub fn new(
        number: u32,
        total_rounds: u32,
        difficulty: f32,
        params: DifficultyParameterSet,
        now: f64,
    ) -> Self {
        Self {
            number,
            total_rounds,
            difficulty,
            params,
            started_at: now,
            ended_at: None,
            completed: false,
        }
    }

    /// Mark finished at `now`
    pub fn finish(&mut self, now: f64, completed: bool) {
        self.ended_at = Some(now);
        self.completed = completed;
    }

    /// Seconds from start to end, if ended
    pub fn duration(&self) -> Option<f64> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// One round attempt within a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based
    pub number: u32,
    pub level_number: u32,
    pub difficulty: f32,
    /// Real clock
    pub started_at: f64,
    pub ended_at: Option<f64>,
    pub completed: bool,
}

impl Round {
    pub fn new(number: u32, level: &Level, now: f64) -> Self {
        Self {
            number,
            level_number: level.number,
            difficulty: level.difficulty,
            started_at: now,
            ended_at: None,
            completed: false,
        }
    }

    pub fn finish(&mut self, now: f64, completed: bool) {
        self.ended_at = Some(now);
        self.completed = completed;
    }

    pub fn duration(&self) -> Option<f64> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Activity flags and failure accounting.
///
/// `round_active` implies `level_active`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionFlags {
    pub level_active: bool,
    pub round_active: bool,
    /// Reset only when a level is initialised
    pub failures_this_level: u32,
    pub failure_limit: u32,
    pub rounds_completed_in_current_level: u32,
}

impl ProgressionFlags {
    pub fn new(failure_limit: u32) -> Self {
        Self {
            failure_limit,
            ..Self::default()
        }
    }

    /// Clear per-level state for a fresh level
    pub fn reset_level(&mut self) {
        self.failures_this_level = 0;
        self.rounds_completed_in_current_level = 0;
    }

    pub fn failure_limit_reached(&self) -> bool {
        self.failures_this_level >= self.failure_limit
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Completed the last level
    Victory,
    /// Hit the failure limit
    Defeat,
}

/// End-of-run report for the game over handler and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub level: u32,
    pub round: u32,
    pub score: u64,
    pub best_score: u64,
    pub levels_completed: u32,
    pub rounds_completed: u32,
    pub perfect_levels: u32,
}
