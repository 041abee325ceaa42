//! Deterministic progression core
//!
//! All gameplay pacing lives here. This module must stay deterministic:
//! - Time only advances through `ProgressionStateMachine::tick`
//! - Seeded RNG only
//! - No rendering, audio or storage; those go through `platform` traits

pub mod difficulty;
pub mod progression;
pub mod scheduler;
pub mod scoring;
pub mod state;
pub mod timeline;

pub use difficulty::{CurveEasing, DifficultyCurve, DifficultyParameterSet, Easing, FloatRange};
pub use progression::{ProgressionStateMachine, Sequence};
pub use scheduler::{LaunchRequest, RoundScheduler, SpawnEvent, SpawnPhase};
pub use scoring::{
    AccuracyAward, AccuracyTier, ReflexTier, ScoreReason, ScoreState, ScoreUpdate, ScoringEngine,
};
pub use state::{Level, ProgressionFlags, Round, RunOutcome, RunSummary};
pub use timeline::Timeline;
