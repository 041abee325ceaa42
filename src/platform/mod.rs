//! Collaborator interfaces
//!
//! The progression core never spawns, draws, plays or stores anything itself.
//! It calls out through these traits, bundled in a `Platform` that is moved
//! into the state machine at construction.

pub mod logging;
pub mod play_area;

pub use logging::{LoggingPlatform, LoggingStats};
pub use play_area::PlayArea;

use glam::Vec2;

use crate::sim::scheduler::LaunchRequest;
use crate::sim::scoring::ScoreUpdate;
use crate::sim::state::{Level, Round, RunSummary};

/// Opaque handle to a spawned ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u32);

/// Picks where the next ball appears
pub trait EntityPlacementProvider {
    fn spawn_position(&mut self) -> Vec2;
}

/// Creates and removes world entities
pub trait EntitySpawner {
    /// Create and launch a ball
    fn spawn_entity(&mut self, request: &LaunchRequest) -> EntityHandle;
    /// Bring the player's collector into the world
    fn spawn_avatar(&mut self);
    fn despawn_avatar(&mut self);
    /// Remove every ball still in play
    fn clear_all_entities(&mut self);
}

/// Typed lifecycle notifications (HUD, analytics)
pub trait NotificationSink {
    fn level_started(&mut self, level: &Level);
    fn level_completed(&mut self, level: &Level);
    fn level_failed(&mut self, _level: &Level) {}
    fn round_started(&mut self, round: &Round);
    fn round_completed(&mut self, round: &Round);
    fn round_failed(&mut self, round: &Round, failures: u32, failure_limit: u32);
    /// The last level was completed
    fn game_won(&mut self, _level: &Level) {}
}

/// Audio/visual feedback the sequences trigger
pub trait FeedbackSink {
    /// Spawn telegraph, shown for `lifespan` seconds
    fn spawn_signal(&mut self, position: Vec2, lifespan: f32);
    fn failure_cue(&mut self);
    fn failure_flash(&mut self);
    fn set_input_suspended(&mut self, suspended: bool);
}

/// Best score storage
pub trait PersistenceProvider {
    fn load_best_score(&mut self) -> u64;
    fn save_score(&mut self, score: u64);
    /// Record a finished run (leaderboard)
    fn record_run(&mut self, _summary: &RunSummary) {}
}

pub trait ThemeProvider {
    fn apply_theme_for_level(&mut self, level: u32);
}

/// Receives the terminal state of a run
pub trait GameOverHandler {
    fn game_over(&mut self, summary: &RunSummary);
}

/// Told about every score change
pub trait ScoreObserver {
    fn score_changed(&mut self, update: &ScoreUpdate);
}

/// Every collaborator the state machine talks to
pub struct Platform {
    pub placement: Box<dyn EntityPlacementProvider>,
    pub spawner: Box<dyn EntitySpawner>,
    pub notifications: Box<dyn NotificationSink>,
    pub persistence: Box<dyn PersistenceProvider>,
    pub game_over: Box<dyn GameOverHandler>,
    pub feedback: Option<Box<dyn FeedbackSink>>,
    pub theme: Option<Box<dyn ThemeProvider>>,
    /// Handed to the scoring engine
    pub scores: Option<Box<dyn ScoreObserver>>,
}

impl Platform {
    pub fn new(
        placement: Box<dyn EntityPlacementProvider>,
        spawner: Box<dyn EntitySpawner>,
        notifications: Box<dyn NotificationSink>,
        persistence: Box<dyn PersistenceProvider>,
        game_over: Box<dyn GameOverHandler>,
    ) -> Self {
        Self {
            placement,
            spawner,
            notifications,
            persistence,
            game_over,
            feedback: None,
            theme: None,
            scores: None,
        }
    }

    pub fn with_feedback(mut self, feedback: Box<dyn FeedbackSink>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn with_theme(mut self, theme: Box<dyn ThemeProvider>) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_score_observer(mut self, observer: Box<dyn ScoreObserver>) -> Self {
        self.scores = Some(observer);
        self
    }
}
