//! Level/round progression state machine
//!
//! Owns the Level x Round state, failure accounting and the paced success,
//! failure and level-completion sequences. Everything observable happens
//! through the `Platform` collaborators.
//!
//! Two clocks advance in `tick`:
//! - real time drives the paced sequences, so they keep running while paused
//! - scaled time (`dt * time_scale`) drives the spawn scheduler and the
//!   scoring timestamps

use std::mem;

use super::difficulty::{DifficultyCurve, DifficultyParameterSet};
use super::scheduler::{RoundScheduler, SpawnEvent};
use super::scoring::ScoringEngine;
use super::state::{Level, ProgressionFlags, Round, RunOutcome, RunSummary};
use super::timeline::Timeline;
use crate::error::ConfigError;
use crate::platform::{FeedbackSink, Platform};
use crate::settings::{ProgressionSettings, SequenceTimings, Settings};

/// Paced sequence currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    RoundSuccess,
    LevelComplete,
    RoundFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SuccessCleanup,
    SuccessDespawn,
    SuccessAdvance,
    SuccessNextRound,
    LevelDespawn,
    LevelAdvance,
    LevelRespawn,
    LevelStart,
    FailureDespawn,
    FailureRetry,
}

pub struct ProgressionStateMachine {
    progression: ProgressionSettings,
    timings: SequenceTimings,
    curve: DifficultyCurve,
    scheduler: RoundScheduler,
    scoring: ScoringEngine,
    platform: Platform,
    timeline: Timeline<Step>,

    real_time: f64,
    sim_time: f64,
    time_scale: f32,

    current_level: u32,
    current_round: u32,
    total_levels_completed: u32,
    total_rounds_completed: u32,
    flags: ProgressionFlags,
    level: Option<Level>,
    round: Option<Round>,
    params: DifficultyParameterSet,

    sequence: Option<Sequence>,
    outcome: Option<RunSummary>,
    spawn_events: Vec<SpawnEvent>,
    warned_no_feedback: bool,
}

impl ProgressionStateMachine {
    /// Build the machine. Invalid settings are rejected here and nowhere else.
    pub fn new(settings: Settings, mut platform: Platform) -> Result<Self, ConfigError> {
        settings.validate()?;

        let max_level = settings.progression.max_level;
        let curve = DifficultyCurve::new(&settings.difficulty, max_level);
        let params = curve.evaluate(1);
        let scheduler = RoundScheduler::new(&settings.spawn, params, settings.seed);
        let mut scoring = ScoringEngine::new(settings.scoring.clone());
        scoring.set_observer(platform.scores.take());

        log::info!(
            "Progression: {} levels x {} rounds, failure limit {}, seed {}",
            max_level,
            settings.progression.rounds_per_level,
            settings.progression.failure_limit,
            settings.seed
        );

        Ok(Self {
            flags: ProgressionFlags::new(settings.progression.failure_limit),
            progression: settings.progression,
            timings: settings.timings,
            curve,
            scheduler,
            scoring,
            platform,
            timeline: Timeline::new(),
            real_time: 0.0,
            sim_time: 0.0,
            time_scale: 1.0,
            current_level: 1,
            current_round: 1,
            total_levels_completed: 0,
            total_rounds_completed: 0,
            level: None,
            round: None,
            params,
            sequence: None,
            outcome: None,
            spawn_events: Vec::new(),
            warned_no_feedback: false,
        })
    }

    /// Session boot: load the best score, reset the session and start level 1
    /// (unless progression is disabled). Also used to start a new run after
    /// game over.
    pub fn start(&mut self) -> bool {
        let best = self.platform.persistence.load_best_score();
        self.scoring.load_best_score(best);
        self.scoring.reset_session();
        self.reset_progression();

        if self.progression.disable_progression {
            log::info!("Progression: testing mode, progression disabled");
            return false;
        }
        self.initialize_level(1)
    }

    // ========================================================================
    // LEVELS
    // ========================================================================

    /// Set up level `number` and start its first round. Cancels any
    /// in-flight sequence so none of its steps land in the new level.
    pub fn initialize_level(&mut self, number: u32) -> bool {
        if self.is_game_over() {
            log::warn!("Progression: run is over, ignoring initialize_level({})", number);
            return false;
        }
        if number == 0 || number > self.progression.max_level {
            log::warn!(
                "Progression: level {} outside 1..={}",
                number,
                self.progression.max_level
            );
            return false;
        }
        self.abort_sequence();
        self.setup_level(number)
    }

    fn setup_level(&mut self, number: u32) -> bool {
        if self.flags.round_active {
            log::warn!("Progression: initializing level over an active round, closing it");
            self.close_round(false);
        }

        self.current_level = number;
        self.current_round = 1;
        self.flags.reset_level();

        let difficulty = self.progression.base_difficulty
            + (number - 1) as f32 * self.progression.difficulty_increase_per_level;
        self.params = self.curve.evaluate(number);
        self.scheduler.configure(self.params);

        self.level = Some(Level::new(
            number,
            self.progression.rounds_per_level,
            difficulty,
            self.params,
            self.real_time,
        ));
        self.flags.level_active = true;
        self.scoring.start_level(number);

        match self.platform.theme.as_mut() {
            Some(theme) => theme.apply_theme_for_level(number),
            None => log::warn!("Progression: no theme provider, theme not applied"),
        }

        log::info!(
            "Progression: initialized level {} (difficulty {:.2}, velocity {:.1}..{:.1})",
            number,
            difficulty,
            self.params.velocity.min,
            self.params.velocity.max
        );
        if let Some(level) = &self.level {
            self.platform.notifications.level_started(level);
        }

        self.begin_round(1)
    }

    /// Give up on the current level without ending the run
    pub fn fail_level(&mut self) -> bool {
        if self.is_game_over() || !self.flags.level_active {
            log::warn!("Progression: fail_level with no active level");
            return false;
        }

        self.abort_sequence();
        if self.flags.round_active {
            self.close_round(false);
            log::info!("Progression: ended scheduler round due to level failure");
        }
        self.flags.level_active = false;
        if let Some(level) = self.level.as_mut() {
            level.finish(self.real_time, false);
        }

        log::info!("Progression: level {} failed", self.current_level);
        if let Some(level) = &self.level {
            self.platform.notifications.level_failed(level);
        }
        true
    }

    /// Skip straight to the next level (debug). No level bonus is awarded.
    pub fn advance_to_next_level(&mut self) -> bool {
        if self.is_game_over() {
            log::warn!("Progression: run is over, ignoring advance");
            return false;
        }
        if self.current_level >= self.progression.max_level {
            log::warn!("Progression: already at the last level");
            return false;
        }

        self.abort_sequence();
        if self.flags.round_active {
            self.close_round(false);
        }
        self.platform.spawner.clear_all_entities();
        let next = self.current_level + 1;
        log::info!("Progression: skipping to level {}", next);
        self.initialize_level(next)
    }

    // ========================================================================
    // ROUNDS
    // ========================================================================

    /// Start round `number` of the active level. Cancels any in-flight
    /// sequence first.
    pub fn start_round(&mut self, number: u32) -> bool {
        if self.is_game_over() {
            log::warn!("Progression: run is over, ignoring start_round({})", number);
            return false;
        }
        if !self.flags.level_active {
            log::warn!("Progression: cannot start round - no active level");
            return false;
        }
        self.abort_sequence();
        self.begin_round(number)
    }

    fn begin_round(&mut self, number: u32) -> bool {
        if self.flags.round_active {
            log::warn!("Progression: restarting round over an active one");
            self.close_round(false);
        }

        let Some(level) = self.level.as_ref() else {
            log::warn!("Progression: level flagged active without level data");
            return false;
        };
        self.current_round = number;
        self.round = Some(Round::new(number, level, self.real_time));
        self.flags.round_active = true;

        self.scoring.start_round(self.sim_time);
        self.platform.spawner.spawn_avatar();
        let position = self.platform.placement.spawn_position();
        self.scheduler.start_round(self.sim_time, position);

        log::info!(
            "Progression: started round {}-{}",
            self.current_level,
            number
        );
        if let Some(round) = &self.round {
            self.platform.notifications.round_started(round);
        }
        true
    }

    /// The ball was captured; score the round and run the success sequence
    pub fn complete_round(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        if self.progression.disable_progression {
            log::debug!("Progression: disabled, ignoring complete_round");
            return false;
        }
        if !self.flags.round_active {
            log::warn!("Progression: complete_round with no active round");
            return false;
        }

        self.flags.round_active = false;
        self.flags.rounds_completed_in_current_level += 1;
        self.total_rounds_completed += 1;
        if let Some(round) = self.round.as_mut() {
            round.finish(self.real_time, true);
        }

        self.scheduler.end_round(self.sim_time);
        self.scoring
            .complete_round(self.current_level, self.current_round, self.sim_time);
        self.platform
            .persistence
            .save_score(self.scoring.current_score());

        log::info!(
            "Progression: round {}-{} completed, starting success sequence",
            self.current_level,
            self.current_round
        );
        self.begin_sequence(Sequence::RoundSuccess);
        if let Some(round) = &self.round {
            self.platform.notifications.round_completed(round);
        }
        self.timeline
            .schedule(self.timings.success_notice, Step::SuccessCleanup);
        true
    }

    /// The ball was lost; retry the round or end the run at the failure limit
    pub fn fail_round(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        if self.progression.disable_progression {
            log::debug!("Progression: disabled, ignoring fail_round");
            return false;
        }
        if !self.flags.round_active {
            log::warn!("Progression: fail_round with no active round");
            return false;
        }

        self.flags.round_active = false;
        self.flags.failures_this_level += 1;
        if let Some(round) = self.round.as_mut() {
            round.finish(self.real_time, false);
        }

        if self.flags.failure_limit_reached() {
            log::info!(
                "Progression: round {}-{} failed, failure limit {} reached",
                self.current_level,
                self.current_round,
                self.flags.failure_limit
            );
            self.scheduler.end_round(self.sim_time);
            self.platform.spawner.clear_all_entities();
            self.platform.spawner.despawn_avatar();
            self.scoring.fail_round();
            self.finish_run(RunOutcome::Defeat);
            return true;
        }

        log::info!(
            "Progression: round {}-{} failed ({}/{}), starting retry sequence",
            self.current_level,
            self.current_round,
            self.flags.failures_this_level,
            self.flags.failure_limit
        );
        if let Some(feedback) = self.feedback() {
            feedback.failure_cue();
        }

        self.begin_sequence(Sequence::RoundFailure);
        if let Some(feedback) = self.feedback() {
            feedback.failure_flash();
            feedback.set_input_suspended(true);
        }
        self.scheduler.end_round(self.sim_time);
        self.platform.spawner.clear_all_entities();
        self.scoring.fail_round();
        if let Some(round) = &self.round {
            self.platform.notifications.round_failed(
                round,
                self.flags.failures_this_level,
                self.flags.failure_limit,
            );
        }
        self.timeline
            .schedule(self.timings.failure_notice, Step::FailureDespawn);
        true
    }

    /// Collector callback: award reflex and accuracy bonuses, then complete
    /// the round. `overlap_ratio <= 0` means the overlap could not be measured.
    pub fn on_entity_captured(&mut self, overlap_ratio: f32) -> bool {
        if self.is_game_over() || self.progression.disable_progression {
            return false;
        }
        if !self.flags.round_active {
            log::warn!("Progression: capture reported with no active round");
            return false;
        }
        self.scoring.award_reflex_bonus(self.sim_time);
        self.scoring.award_accuracy_bonus(overlap_ratio);
        self.complete_round()
    }

    /// Collector callback: the ball escaped
    pub fn on_capture_failed(&mut self) -> bool {
        self.fail_round()
    }

    /// Back to level 1 round 1 from any state, cancelling every pending step
    pub fn reset_progression(&mut self) {
        self.abort_sequence();
        if self.scheduler.is_round_open() {
            self.scheduler.end_round(self.sim_time);
        }

        self.flags = ProgressionFlags::new(self.progression.failure_limit);
        self.current_level = 1;
        self.current_round = 1;
        self.total_levels_completed = 0;
        self.total_rounds_completed = 0;
        self.level = None;
        self.round = None;
        self.params = self.curve.evaluate(1);
        self.scheduler.configure(self.params);
        self.scheduler.reset_spawn_count();
        self.spawn_events.clear();
        self.outcome = None;

        log::info!("Progression: reset to beginning");
    }

    // ========================================================================
    // DRIVING
    // ========================================================================

    /// Advance both clocks by `dt` real seconds and fire everything due
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Progression: ignoring tick with dt {}", dt);
            return;
        }
        self.real_time += f64::from(dt);
        self.sim_time += f64::from(dt * self.time_scale);

        while let Some(step) = self.timeline.poll(self.real_time) {
            self.run_step(step);
        }

        self.scheduler.tick(self.sim_time, &mut self.spawn_events);
        for event in mem::take(&mut self.spawn_events) {
            match event {
                SpawnEvent::Signal { position, lifespan } => {
                    if let Some(feedback) = self.feedback() {
                        feedback.spawn_signal(position, lifespan);
                    }
                }
                SpawnEvent::Launch(request) => {
                    let handle = self.platform.spawner.spawn_entity(&request);
                    log::debug!("Progression: launched ball {:?}", handle);
                }
            }
        }
    }

    /// Scale applied to simulation time; 0 pauses spawning and reflex timing
    pub fn set_time_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale < 0.0 {
            log::warn!("Progression: invalid time scale {}", scale);
            return;
        }
        self.time_scale = scale;
    }

    fn run_step(&mut self, step: Step) {
        log::debug!("Progression: step {:?}", step);
        match step {
            Step::SuccessCleanup => {
                self.platform.spawner.clear_all_entities();
                self.timeline
                    .schedule(self.timings.success_cleanup, Step::SuccessDespawn);
            }
            Step::SuccessDespawn => {
                self.platform.spawner.despawn_avatar();
                self.timeline
                    .schedule(self.timings.success_progression, Step::SuccessAdvance);
            }
            Step::SuccessAdvance => {
                if self.flags.rounds_completed_in_current_level < self.progression.rounds_per_level {
                    self.platform.spawner.spawn_avatar();
                    self.timeline
                        .schedule(self.timings.success_respawn, Step::SuccessNextRound);
                } else {
                    self.complete_level();
                }
            }
            Step::SuccessNextRound => {
                self.sequence = None;
                self.begin_round(self.current_round + 1);
            }
            Step::LevelDespawn => {
                self.platform.spawner.despawn_avatar();
                self.timeline
                    .schedule(self.timings.level_despawn, Step::LevelAdvance);
            }
            Step::LevelAdvance => {
                if self.current_level >= self.progression.max_level {
                    log::info!("Progression: final level {} cleared", self.current_level);
                    if let Some(level) = &self.level {
                        self.platform.notifications.game_won(level);
                    }
                    self.finish_run(RunOutcome::Victory);
                    return;
                }
                self.current_level += 1;
                self.current_round = 1;
                self.flags.rounds_completed_in_current_level = 0;
                log::info!("Progression: advancing to level {}", self.current_level);
                self.timeline
                    .schedule(self.timings.level_advance, Step::LevelRespawn);
            }
            Step::LevelRespawn => {
                self.platform.spawner.spawn_avatar();
                self.timeline
                    .schedule(self.timings.level_respawn, Step::LevelStart);
            }
            Step::LevelStart => {
                self.sequence = None;
                self.setup_level(self.current_level);
            }
            Step::FailureDespawn => {
                self.platform.spawner.despawn_avatar();
                self.timeline
                    .schedule(self.timings.failure_despawn, Step::FailureRetry);
            }
            Step::FailureRetry => {
                self.sequence = None;
                self.platform.spawner.spawn_avatar();
                self.begin_round(self.current_round);
                if let Some(feedback) = self.feedback() {
                    feedback.set_input_suspended(false);
                }
            }
        }
    }

    /// Level-complete path; continues the success sequence's chain
    fn complete_level(&mut self) {
        self.flags.level_active = false;
        self.total_levels_completed += 1;
        if let Some(level) = self.level.as_mut() {
            level.finish(self.real_time, true);
        }
        self.scoring.complete_level(self.current_level);
        self.platform
            .persistence
            .save_score(self.scoring.current_score());

        log::info!(
            "Progression: level {} completed, starting level completion sequence",
            self.current_level
        );
        self.sequence = Some(Sequence::LevelComplete);
        if let Some(level) = &self.level {
            self.platform.notifications.level_completed(level);
        }
        self.timeline
            .schedule(self.timings.level_notice, Step::LevelDespawn);
    }

    fn begin_sequence(&mut self, sequence: Sequence) {
        if let Some(previous) = self.sequence {
            log::warn!(
                "Progression: {:?} supersedes in-flight {:?}",
                sequence,
                previous
            );
        }
        self.timeline.begin(self.real_time);
        self.sequence = Some(sequence);
    }

    /// Cancel the in-flight sequence, restoring input if it was suspended
    fn abort_sequence(&mut self) {
        self.timeline.cancel();
        if self.sequence.take() == Some(Sequence::RoundFailure) {
            if let Some(feedback) = self.feedback() {
                feedback.set_input_suspended(false);
            }
        }
    }

    fn close_round(&mut self, completed: bool) {
        self.flags.round_active = false;
        self.scheduler.end_round(self.sim_time);
        if let Some(round) = self.round.as_mut() {
            round.finish(self.real_time, completed);
        }
    }

    /// Terminal state: no further steps fire and external calls are ignored
    fn finish_run(&mut self, outcome: RunOutcome) {
        self.timeline.cancel();
        self.sequence = None;
        self.flags.level_active = false;
        self.flags.round_active = false;

        let state = self.scoring.state();
        let summary = RunSummary {
            outcome,
            level: self.current_level,
            round: self.current_round,
            score: state.current_score,
            best_score: state.best_score,
            levels_completed: self.total_levels_completed,
            rounds_completed: self.total_rounds_completed,
            perfect_levels: state.perfect_levels,
        };

        log::info!(
            "Progression: game over ({:?}) at {}-{}, {}",
            outcome,
            summary.level,
            summary.round,
            self.scoring.session_stats()
        );
        self.platform.persistence.save_score(summary.score);
        self.platform.persistence.record_run(&summary);
        self.platform.game_over.game_over(&summary);
        self.outcome = Some(summary);
    }

    fn feedback(&mut self) -> Option<&mut (dyn FeedbackSink + 'static)> {
        if self.platform.feedback.is_none() && !self.warned_no_feedback {
            log::warn!("Progression: no feedback sink, cues and input suspension skipped");
            self.warned_no_feedback = true;
        }
        self.platform.feedback.as_deref_mut()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// "level-round", e.g. "2-3"
    pub fn progression_label(&self) -> String {
        format!("{}-{}", self.current_level, self.current_round)
    }

    /// Difficulty scalar of the current level
    pub fn current_difficulty(&self) -> f32 {
        self.level
            .as_ref()
            .map_or(self.progression.base_difficulty, |l| l.difficulty)
    }

    /// Curve parameters in effect
    pub fn current_params(&self) -> &DifficultyParameterSet {
        &self.params
    }

    /// Completed fraction of the current level; 1 when no level is active
    pub fn level_progress(&self) -> f32 {
        if !self.flags.level_active {
            return 1.0;
        }
        self.flags.rounds_completed_in_current_level as f32
            / self.progression.rounds_per_level as f32
    }

    pub fn is_in_level(&self) -> bool {
        self.flags.level_active
    }

    /// False while progression is disabled
    pub fn is_in_round(&self) -> bool {
        !self.progression.disable_progression && self.flags.round_active
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Set once the run has ended
    pub fn outcome(&self) -> Option<&RunSummary> {
        self.outcome.as_ref()
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn total_levels_completed(&self) -> u32 {
        self.total_levels_completed
    }

    pub fn total_rounds_completed(&self) -> u32 {
        self.total_rounds_completed
    }

    pub fn flags(&self) -> &ProgressionFlags {
        &self.flags
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Sequence in flight, if any
    pub fn active_sequence(&self) -> Option<Sequence> {
        self.sequence
    }

    /// True when no sequence step is pending
    pub fn is_sequence_idle(&self) -> bool {
        self.timeline.is_idle()
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }

    pub fn curve(&self) -> &DifficultyCurve {
        &self.curve
    }

    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}
