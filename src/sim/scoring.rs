//! Score bookkeeping and bonus computation
//!
//! The engine never starts transitions on its own; the progression state
//! machine calls its lifecycle hooks. Every score increase is reported to an
//! optional `ScoreObserver` (HUD, persistence) rather than handled here.

use serde::{Deserialize, Serialize};

use crate::consts::{LEVEL_BONUS_UNIT, ROUND_SCORE_UNIT};
use crate::platform::ScoreObserver;
use crate::settings::{AccuracyTiers, ReflexTiers, ScoringSettings};

/// Reflex rating by capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReflexTier {
    Fast,
    Quick,
    Slow,
    /// Over the low threshold, no bonus
    TooSlow,
}

impl ReflexTier {
    pub fn classify(elapsed: f64, tiers: &ReflexTiers) -> Self {
        if elapsed <= f64::from(tiers.high_threshold) {
            ReflexTier::Fast
        } else if elapsed <= f64::from(tiers.medium_threshold) {
            ReflexTier::Quick
        } else if elapsed <= f64::from(tiers.low_threshold) {
            ReflexTier::Slow
        } else {
            ReflexTier::TooSlow
        }
    }

    pub fn bonus(self, tiers: &ReflexTiers) -> u64 {
        match self {
            ReflexTier::Fast => tiers.high_bonus,
            ReflexTier::Quick => tiers.medium_bonus,
            ReflexTier::Slow => tiers.low_bonus,
            ReflexTier::TooSlow => 0,
        }
    }

    /// HUD label
    pub fn label(self) -> &'static str {
        match self {
            ReflexTier::Fast => "Fast!",
            ReflexTier::Quick => "Quick",
            ReflexTier::Slow | ReflexTier::TooSlow => "Slow",
        }
    }
}

/// Accuracy rating by overlap ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyTier {
    Perfect,
    Great,
    Good,
    Poor,
}

impl AccuracyTier {
    pub fn classify(ratio: f32, tiers: &AccuracyTiers) -> Self {
        if ratio >= tiers.perfect_threshold {
            AccuracyTier::Perfect
        } else if ratio >= tiers.great_threshold {
            AccuracyTier::Great
        } else if ratio >= tiers.good_threshold {
            AccuracyTier::Good
        } else {
            AccuracyTier::Poor
        }
    }

    pub fn bonus(self, tiers: &AccuracyTiers) -> u64 {
        match self {
            AccuracyTier::Perfect => tiers.perfect_bonus,
            AccuracyTier::Great => tiers.great_bonus,
            AccuracyTier::Good => tiers.good_bonus,
            AccuracyTier::Poor => 0,
        }
    }

    /// HUD label
    pub fn label(self) -> &'static str {
        match self {
            AccuracyTier::Perfect => "Perfect!",
            AccuracyTier::Great => "Great",
            AccuracyTier::Good => "Good",
            AccuracyTier::Poor => "Poor",
        }
    }
}

/// Result of an accuracy award
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyAward {
    /// Ratio the tier was computed from
    pub ratio: f32,
    /// True when the reported ratio was <= 0 and the fallback was used
    pub substituted: bool,
    pub tier: AccuracyTier,
    pub bonus: u64,
}

/// Why the score changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreReason {
    Round { level: u32, round: u32 },
    Reflex(ReflexTier),
    Accuracy(AccuracyTier),
    LevelComplete { level: u32 },
    PerfectLevel { level: u32 },
    Bonus,
    Set,
    SessionReset,
}

/// Reported to the score observer after every change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub reason: ScoreReason,
    /// Signed change in current score
    pub delta: i64,
    pub current: u64,
    pub best: u64,
    /// This change raised the best score
    pub new_best: bool,
}

/// Session score and counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub current_score: u64,
    /// Loaded once from persistence; survives session resets
    pub best_score: u64,
    pub rounds_completed: u32,
    pub levels_completed: u32,
    pub perfect_levels: u32,
    pub current_level: u32,
    pub level_active: bool,
    pub rounds_completed_in_current_level: u32,
    pub rounds_failed_in_current_level: u32,
    /// Scaled clock time the active round started
    pub round_started_at: f64,
    pub round_active: bool,
    /// Sum of completed round durations
    pub total_time_elapsed: f64,
}

pub struct ScoringEngine {
    settings: ScoringSettings,
    state: ScoreState,
    observer: Option<Box<dyn ScoreObserver>>,
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("state", &self.state)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ScoringEngine {
    pub fn new(settings: ScoringSettings) -> Self {
        Self {
            settings,
            state: ScoreState {
                current_level: 1,
                ..ScoreState::default()
            },
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ScoreObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn ScoreObserver>>) {
        self.observer = observer;
    }

    /// Seed the best score from persistence
    pub fn load_best_score(&mut self, best: u64) {
        self.state.best_score = best;
        log::info!("Scoring: loaded best score {}", best);
    }

    /// Zero all session counters; the best score is kept
    pub fn reset_session(&mut self) {
        let best_score = self.state.best_score;
        let previous = self.state.current_score;
        self.state = ScoreState {
            best_score,
            current_level: 1,
            ..ScoreState::default()
        };
        log::info!("Scoring: session reset");
        self.report(ScoreReason::SessionReset, -signed(previous), false);
    }

    /// Begin tracking a level; clears per-level counters
    pub fn start_level(&mut self, level: u32) {
        self.state.current_level = level;
        self.state.level_active = true;
        self.state.rounds_completed_in_current_level = 0;
        self.state.rounds_failed_in_current_level = 0;
        log::debug!("Scoring: tracking level {}", level);
    }

    /// Stamp the round start. Restarting an active round overwrites the stamp.
    pub fn start_round(&mut self, now: f64) {
        if self.state.round_active {
            log::warn!("Scoring: start_round while a round is active, restarting timer");
        }
        self.state.round_started_at = now;
        self.state.round_active = true;
        log::debug!("Scoring: round started at {:.2}", now);
    }

    /// Award the reflex bonus for a capture at `now`. Returns points added.
    pub fn award_reflex_bonus(&mut self, now: f64) -> u64 {
        if !self.state.round_active {
            log::warn!("Scoring: award_reflex_bonus called but no round is active");
            return 0;
        }
        let elapsed = now - self.state.round_started_at;
        let tier = ReflexTier::classify(elapsed, &self.settings.reflex);
        let bonus = tier.bonus(&self.settings.reflex);
        if bonus > 0 {
            self.add(bonus, ScoreReason::Reflex(tier));
            log::info!("Scoring: reflex bonus {} (capture {:.2}s)", bonus, elapsed);
        } else {
            log::info!(
                "Scoring: no reflex bonus, capture {:.2}s over {}s",
                elapsed,
                self.settings.reflex.low_threshold
            );
        }
        bonus
    }

    /// Award the accuracy bonus for an overlap ratio in [0, 1].
    ///
    /// A ratio <= 0 means the collector could not measure the overlap; the
    /// configured fallback ratio is scored instead. Returns `None` when no
    /// round is active.
    pub fn award_accuracy_bonus(&mut self, overlap_ratio: f32) -> Option<AccuracyAward> {
        if !self.state.round_active {
            log::warn!("Scoring: award_accuracy_bonus called but no round is active");
            return None;
        }
        let (ratio, substituted) = self.effective_ratio(overlap_ratio);
        let tier = AccuracyTier::classify(ratio, &self.settings.accuracy);
        let bonus = tier.bonus(&self.settings.accuracy);
        if bonus > 0 {
            self.add(bonus, ScoreReason::Accuracy(tier));
            log::info!(
                "Scoring: {} capture, overlap {:.1}%, +{}",
                tier.label(),
                ratio * 100.0,
                bonus
            );
        } else {
            log::info!("Scoring: no accuracy bonus, overlap {:.1}%", ratio * 100.0);
        }
        Some(AccuracyAward {
            ratio,
            substituted,
            tier,
            bonus,
        })
    }

    fn effective_ratio(&self, overlap_ratio: f32) -> (f32, bool) {
        if overlap_ratio > 0.0 {
            return (overlap_ratio.min(1.0), false);
        }
        match self.settings.accuracy_fallback {
            Some(fallback) => {
                log::warn!(
                    "Scoring: overlap ratio {} unmeasured, using fallback {}",
                    overlap_ratio,
                    fallback
                );
                (fallback, true)
            }
            None => {
                log::warn!("Scoring: overlap ratio {} unmeasured, scoring as poor", overlap_ratio);
                (0.0, false)
            }
        }
    }

    /// Score a completed round: `round * level * 500`. Returns points added.
    pub fn complete_round(&mut self, level: u32, round: u32, now: f64) -> Option<u64> {
        if !self.state.round_active {
            log::warn!("Scoring: complete_round called but no round is active");
            return None;
        }
        let round_time = now - self.state.round_started_at;
        self.state.round_active = false;
        self.state.rounds_completed += 1;
        self.state.rounds_completed_in_current_level += 1;
        self.state.total_time_elapsed += round_time;

        let points = u64::from(round) * u64::from(level) * ROUND_SCORE_UNIT;
        self.add(points, ScoreReason::Round { level, round });
        log::info!(
            "Scoring: round {}-{} completed in {:.2}s, {} x {} x {} = {}",
            level,
            round,
            round_time,
            round,
            level,
            ROUND_SCORE_UNIT,
            points
        );
        Some(points)
    }

    /// Count a failed round against the active level; no penalty.
    /// The round timer stops so the retry starts clean.
    pub fn fail_round(&mut self) {
        self.state.round_active = false;
        if !self.state.level_active {
            log::debug!("Scoring: fail_round with no active level, not counted");
            return;
        }
        self.state.rounds_failed_in_current_level += 1;
        log::info!(
            "Scoring: round failed, {} failures this level",
            self.state.rounds_failed_in_current_level
        );
    }

    /// Level bonus `level * 100`, plus the perfect bonus when no round failed.
    /// Returns points added.
    pub fn complete_level(&mut self, level: u32) -> u64 {
        self.state.levels_completed += 1;
        self.state.level_active = false;

        let level_bonus = u64::from(level) * LEVEL_BONUS_UNIT;
        self.add(level_bonus, ScoreReason::LevelComplete { level });
        let mut total = level_bonus;

        let perfect = self.state.rounds_failed_in_current_level == 0;
        if perfect {
            let bonus = self.settings.perfect_level_bonus;
            self.state.perfect_levels += 1;
            self.add(bonus, ScoreReason::PerfectLevel { level });
            total += bonus;
        }
        log::info!(
            "Scoring: level {} completed, perfect: {}, failures: {}",
            level,
            perfect,
            self.state.rounds_failed_in_current_level
        );
        total
    }

    /// Add an arbitrary bonus
    pub fn add_bonus(&mut self, points: u64, reason: &str) {
        log::info!("Scoring: {} +{}", reason, points);
        self.add(points, ScoreReason::Bonus);
    }

    /// Overwrite the current score (debug tooling); best score only grows
    pub fn set_score(&mut self, score: u64) {
        let delta = signed(score).saturating_sub(signed(self.state.current_score));
        self.state.current_score = score;
        let new_best = self.raise_best();
        self.report(ScoreReason::Set, delta, new_best);
    }

    fn add(&mut self, points: u64, reason: ScoreReason) {
        let before = self.state.current_score;
        self.state.current_score = before.saturating_add(points);
        let new_best = self.raise_best();
        if new_best {
            log::info!("Scoring: new best score {}", self.state.best_score);
        }
        self.report(reason, signed(self.state.current_score - before), new_best);
    }

    fn raise_best(&mut self) -> bool {
        if self.state.current_score > self.state.best_score {
            self.state.best_score = self.state.current_score;
            true
        } else {
            false
        }
    }

    fn report(&mut self, reason: ScoreReason, delta: i64, new_best: bool) {
        if let Some(observer) = self.observer.as_mut() {
            observer.score_changed(&ScoreUpdate {
                reason,
                delta,
                current: self.state.current_score,
                best: self.state.best_score,
                new_best,
            });
        }
    }

    /// Reflex rating a capture at `now` would get (HUD preview)
    pub fn reflex_rating(&self, now: f64) -> ReflexTier {
        if !self.state.round_active {
            return ReflexTier::TooSlow;
        }
        ReflexTier::classify(now - self.state.round_started_at, &self.settings.reflex)
    }

    /// Accuracy rating for a ratio, fallback applied (HUD preview)
    pub fn accuracy_rating(&self, overlap_ratio: f32) -> AccuracyTier {
        let (ratio, _) = self.effective_ratio(overlap_ratio);
        AccuracyTier::classify(ratio, &self.settings.accuracy)
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn current_score(&self) -> u64 {
        self.state.current_score
    }

    pub fn best_score(&self) -> u64 {
        self.state.best_score
    }

    pub fn is_round_active(&self) -> bool {
        self.state.round_active
    }

    /// One-line session summary
    pub fn session_stats(&self) -> String {
        format!(
            "Score: {} | Rounds: {} | Levels: {} | Perfect Levels: {} | Time: {:.1}s",
            self.state.current_score,
            self.state.rounds_completed,
            self.state.levels_completed,
            self.state.perfect_levels,
            self.state.total_time_elapsed
        )
    }
}

/// Score as a signed delta, clamped to `i64::MAX`
fn signed(points: u64) -> i64 {
    i64::try_from(points).unwrap_or(i64::MAX)
}
