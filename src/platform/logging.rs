//! Headless collaborator that logs every call
//!
//! Used by the native demo. Clones share one `LoggingStats`, so the driver
//! can watch what the state machine asked for.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::{
    EntityHandle, EntitySpawner, FeedbackSink, GameOverHandler, NotificationSink, ScoreObserver,
    ThemeProvider,
};
use crate::sim::scheduler::LaunchRequest;
use crate::sim::scoring::ScoreUpdate;
use crate::sim::state::{Level, Round, RunSummary};

#[derive(Debug, Clone, Default)]
pub struct LoggingStats {
    /// Balls currently in play
    pub live_entities: Vec<EntityHandle>,
    pub total_launched: u32,
    pub avatar_present: bool,
    pub input_suspended: bool,
    pub rounds_started: u32,
    pub levels_started: u32,
    pub game_over: Option<RunSummary>,
    next_handle: u32,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingPlatform {
    stats: Rc<RefCell<LoggingStats>>,
}

impl LoggingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has happened so far
    pub fn stats(&self) -> LoggingStats {
        self.stats.borrow().clone()
    }

    /// True while a launched ball is still in play
    pub fn has_live_entity(&self) -> bool {
        !self.stats.borrow().live_entities.is_empty()
    }
}

impl EntitySpawner for LoggingPlatform {
    fn spawn_entity(&mut self, request: &LaunchRequest) -> EntityHandle {
        let mut stats = self.stats.borrow_mut();
        stats.next_handle += 1;
        let handle = EntityHandle(stats.next_handle);
        stats.live_entities.push(handle);
        stats.total_launched += 1;
        log::info!(
            "[spawner] ball {} at ({:.2}, {:.2}) dir ({:.2}, {:.2}) speed {:.2} mass {:.2}",
            handle.0,
            request.position.x,
            request.position.y,
            request.direction.x,
            request.direction.y,
            request.speed,
            request.mass
        );
        handle
    }

    fn spawn_avatar(&mut self) {
        self.stats.borrow_mut().avatar_present = true;
        log::info!("[spawner] avatar spawned");
    }

    fn despawn_avatar(&mut self) {
        self.stats.borrow_mut().avatar_present = false;
        log::info!("[spawner] avatar despawned");
    }

    fn clear_all_entities(&mut self) {
        let cleared = std::mem::take(&mut self.stats.borrow_mut().live_entities);
        log::info!("[spawner] cleared {} balls", cleared.len());
    }
}

impl NotificationSink for LoggingPlatform {
    fn level_started(&mut self, level: &Level) {
        self.stats.borrow_mut().levels_started += 1;
        log::info!(
            "[hud] Level {} started (difficulty {:.1}, {} rounds)",
            level.number,
            level.difficulty,
            level.total_rounds
        );
    }

    fn level_completed(&mut self, level: &Level) {
        log::info!(
            "[hud] Level {} complete in {:.1}s",
            level.number,
            level.duration().unwrap_or_default()
        );
    }

    fn level_failed(&mut self, level: &Level) {
        log::info!("[hud] Level {} failed", level.number);
    }

    fn round_started(&mut self, round: &Round) {
        self.stats.borrow_mut().rounds_started += 1;
        log::info!("[hud] Round {}-{}", round.level_number, round.number);
    }

    fn round_completed(&mut self, round: &Round) {
        log::info!(
            "[hud] Round {}-{} complete",
            round.level_number,
            round.number
        );
    }

    fn round_failed(&mut self, round: &Round, failures: u32, failure_limit: u32) {
        log::info!(
            "[hud] Round {}-{} failed ({}/{})",
            round.level_number,
            round.number,
            failures,
            failure_limit
        );
    }

    fn game_won(&mut self, level: &Level) {
        log::info!("[hud] All {} levels cleared!", level.number);
    }
}

impl FeedbackSink for LoggingPlatform {
    fn spawn_signal(&mut self, position: Vec2, lifespan: f32) {
        log::debug!(
            "[vfx] spawn signal at ({:.2}, {:.2}) for {:.1}s",
            position.x,
            position.y,
            lifespan
        );
    }

    fn failure_cue(&mut self) {
        log::debug!("[audio] failure cue");
    }

    fn failure_flash(&mut self) {
        log::debug!("[vfx] failure flash");
    }

    fn set_input_suspended(&mut self, suspended: bool) {
        self.stats.borrow_mut().input_suspended = suspended;
        log::debug!("[input] suspended: {}", suspended);
    }
}

impl ThemeProvider for LoggingPlatform {
    fn apply_theme_for_level(&mut self, level: u32) {
        log::debug!("[theme] level {}", level);
    }
}

impl GameOverHandler for LoggingPlatform {
    fn game_over(&mut self, summary: &RunSummary) {
        log::info!(
            "[game] {:?} at {}-{} with {} points",
            summary.outcome,
            summary.level,
            summary.round,
            summary.score
        );
        self.stats.borrow_mut().game_over = Some(summary.clone());
    }
}

impl ScoreObserver for LoggingPlatform {
    fn score_changed(&mut self, update: &ScoreUpdate) {
        log::debug!(
            "[score] {:+} ({:?}) -> {} (best {})",
            update.delta,
            update.reason,
            update.current,
            update.best
        );
    }
}
