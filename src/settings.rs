//! Game balance and pacing settings
//!
//! Every tunable the progression core reads lives here. Defaults match the
//! shipped game; a JSON document may override any subset of fields.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SettingsError};
use crate::sim::difficulty::{CurveEasing, DifficultyParameterSet, FloatRange};

/// Level/round structure and failure policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    /// Rounds that make up one level
    pub rounds_per_level: u32,
    /// Last level; completing it wins the run
    pub max_level: u32,
    /// Round failures within one level before the run ends
    pub failure_limit: u32,
    /// Difficulty scalar of level 1
    pub base_difficulty: f32,
    /// Difficulty scalar added per level
    pub difficulty_increase_per_level: f32,
    /// Test mode: completion/failure calls are ignored and no level is started on boot
    pub disable_progression: bool,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            rounds_per_level: 3,
            max_level: 20,
            failure_limit: 10,
            base_difficulty: 1.0,
            difficulty_increase_per_level: 0.2,
            disable_progression: false,
        }
    }
}

/// Difficulty curve endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    /// When false every level plays with the base values
    pub scaling_enabled: bool,
    /// Values at level 1
    pub base: DifficultyParameterSet,
    /// Values at `max_level`
    pub max: DifficultyParameterSet,
    /// Easing applied to level progress before interpolation
    pub easing: CurveEasing,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            scaling_enabled: true,
            base: DifficultyParameterSet {
                velocity: FloatRange::new(2.0, 4.0),
                anticipation: FloatRange::new(1.2, 1.8),
                bounciness: FloatRange::new(0.8, 1.2),
                gravity: FloatRange::new(0.8, 1.2),
                round_duration: 45.0,
            },
            max: DifficultyParameterSet {
                velocity: FloatRange::new(8.0, 15.0),
                anticipation: FloatRange::new(0.2, 0.5),
                bounciness: FloatRange::new(0.2, 2.0),
                gravity: FloatRange::new(0.2, 1.8),
                round_duration: 15.0,
            },
            easing: CurveEasing::default(),
        }
    }
}

/// Ball launch settings that do not scale with difficulty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// How long the spawn signal shows before the ball appears (scaled seconds)
    pub signal_lifespan: f32,
    /// Random rotation applied to the preferred direction (degrees, ±)
    pub direction_variance: f32,
    /// When false balls always launch along +X
    pub randomize_direction: bool,
    /// Ball mass range
    pub mass: FloatRange,
    /// Play area lower-left corner
    pub play_area_min: Vec2,
    /// Play area upper-right corner
    pub play_area_max: Vec2,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            signal_lifespan: 1.0,
            direction_variance: 30.0,
            randomize_direction: true,
            mass: FloatRange::new(0.5, 2.0),
            play_area_min: Vec2::new(-8.0, -4.5),
            play_area_max: Vec2::new(8.0, 4.5),
        }
    }
}

/// Reflex bonus tiers (elapsed scaled seconds since round start)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexTiers {
    pub high_threshold: f32,
    pub medium_threshold: f32,
    pub low_threshold: f32,
    pub high_bonus: u64,
    pub medium_bonus: u64,
    pub low_bonus: u64,
}

impl Default for ReflexTiers {
    fn default() -> Self {
        Self {
            high_threshold: 2.0,
            medium_threshold: 4.0,
            low_threshold: 6.0,
            high_bonus: 500,
            medium_bonus: 300,
            low_bonus: 100,
        }
    }
}

/// Accuracy bonus tiers (overlap ratio 0..1)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyTiers {
    pub perfect_threshold: f32,
    pub great_threshold: f32,
    pub good_threshold: f32,
    pub perfect_bonus: u64,
    pub great_bonus: u64,
    pub good_bonus: u64,
}

impl Default for AccuracyTiers {
    fn default() -> Self {
        Self {
            perfect_threshold: 0.95,
            great_threshold: 0.85,
            good_threshold: 0.70,
            perfect_bonus: 1000,
            great_bonus: 500,
            good_bonus: 200,
        }
    }
}

/// Score bonuses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Added when a level is finished without a single failed round
    pub perfect_level_bonus: u64,
    pub reflex: ReflexTiers,
    pub accuracy: AccuracyTiers,
    /// Ratio substituted when the collector reports an overlap of 0.
    /// `None` scores such captures as poor instead.
    pub accuracy_fallback: Option<f32>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            perfect_level_bonus: 1000,
            reflex: ReflexTiers::default(),
            accuracy: AccuracyTiers::default(),
            accuracy_fallback: Some(crate::consts::ACCURACY_FALLBACK_RATIO),
        }
    }
}

/// Pauses between the steps of the paced sequences (real seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceTimings {
    /// Round complete message before leftovers are cleared
    pub success_notice: f32,
    /// Cleanup before the avatar is despawned
    pub success_cleanup: f32,
    /// Level-round label display before the avatar returns
    pub success_progression: f32,
    /// Avatar respawn before the next round starts
    pub success_respawn: f32,
    /// Level complete message before the avatar is despawned
    pub level_notice: f32,
    /// Despawned avatar before advancing
    pub level_despawn: f32,
    /// Next level label before the avatar returns
    pub level_advance: f32,
    /// Avatar respawn before the next level starts
    pub level_respawn: f32,
    /// Failure feedback before the avatar is despawned
    pub failure_notice: f32,
    /// Despawned avatar before the retry
    pub failure_despawn: f32,
}

impl Default for SequenceTimings {
    fn default() -> Self {
        Self {
            success_notice: 1.5,
            success_cleanup: 1.5,
            success_progression: 1.0,
            success_respawn: 0.5,
            level_notice: 2.0,
            level_despawn: 1.5,
            level_advance: 1.0,
            level_respawn: 0.5,
            failure_notice: 1.0,
            failure_despawn: 1.0,
        }
    }
}

impl SequenceTimings {
    /// Real time from a round completion to the next round starting
    pub fn success_total(&self) -> f32 {
        self.success_notice + self.success_cleanup + self.success_progression + self.success_respawn
    }

    /// Real time from a round failure to the retry starting
    pub fn failure_total(&self) -> f32 {
        self.failure_notice + self.failure_despawn
    }

    /// Real time from the level complete notice to the next level starting
    pub fn level_total(&self) -> f32 {
        self.level_notice + self.level_despawn + self.level_advance + self.level_respawn
    }

    /// Zero every pause (useful for headless tests)
    pub fn instant() -> Self {
        Self {
            success_notice: 0.0,
            success_cleanup: 0.0,
            success_progression: 0.0,
            success_respawn: 0.0,
            level_notice: 0.0,
            level_despawn: 0.0,
            level_advance: 0.0,
            level_respawn: 0.0,
            failure_notice: 0.0,
            failure_despawn: 0.0,
        }
    }
}

/// Complete settings tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for spawn sampling and placement
    pub seed: u64,
    pub progression: ProgressionSettings,
    pub difficulty: DifficultySettings,
    pub spawn: SpawnSettings,
    pub scoring: ScoringSettings,
    pub timings: SequenceTimings,
}

impl Settings {
    /// Parse settings from a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the progression core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.progression;
        if p.max_level == 0 {
            return Err(ConfigError::MaxLevelZero);
        }
        if p.rounds_per_level == 0 {
            return Err(ConfigError::RoundsPerLevelZero);
        }
        if p.failure_limit == 0 {
            return Err(ConfigError::FailureLimitZero);
        }
        check_value("base_difficulty", p.base_difficulty)?;
        check_value("difficulty_increase_per_level", p.difficulty_increase_per_level)?;

        self.difficulty.base.validate()?;
        self.difficulty.max.validate()?;

        let s = &self.spawn;
        check_value("signal_lifespan", s.signal_lifespan)?;
        check_value("direction_variance", s.direction_variance)?;
        check_range("mass", s.mass)?;
        if s.play_area_min.x > s.play_area_max.x {
            return Err(ConfigError::InvertedRange {
                name: "play_area.x",
                min: s.play_area_min.x,
                max: s.play_area_max.x,
            });
        }
        if s.play_area_min.y > s.play_area_max.y {
            return Err(ConfigError::InvertedRange {
                name: "play_area.y",
                min: s.play_area_min.y,
                max: s.play_area_max.y,
            });
        }

        let r = &self.scoring.reflex;
        check_value("reflex.high_threshold", r.high_threshold)?;
        if !(r.high_threshold <= r.medium_threshold && r.medium_threshold <= r.low_threshold) {
            return Err(ConfigError::ReflexThresholdOrder);
        }
        let a = &self.scoring.accuracy;
        check_value("accuracy.good_threshold", a.good_threshold)?;
        if !(a.perfect_threshold >= a.great_threshold && a.great_threshold >= a.good_threshold) {
            return Err(ConfigError::AccuracyThresholdOrder);
        }
        if let Some(fallback) = self.scoring.accuracy_fallback {
            check_value("accuracy_fallback", fallback)?;
        }

        let t = &self.timings;
        for (name, value) in [
            ("success_notice", t.success_notice),
            ("success_cleanup", t.success_cleanup),
            ("success_progression", t.success_progression),
            ("success_respawn", t.success_respawn),
            ("level_notice", t.level_notice),
            ("level_despawn", t.level_despawn),
            ("level_advance", t.level_advance),
            ("level_respawn", t.level_respawn),
            ("failure_notice", t.failure_notice),
            ("failure_despawn", t.failure_despawn),
        ] {
            check_value(name, value)?;
        }
        Ok(())
    }
}

pub(crate) fn check_value(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { name, value })
    }
}

pub(crate) fn check_range(name: &'static str, range: FloatRange) -> Result<(), ConfigError> {
    check_value(name, range.min)?;
    check_value(name, range.max)?;
    if range.min > range.max {
        return Err(ConfigError::InvertedRange {
            name,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{ "seed": 7, "progression": { "failure_limit": 3 } }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.progression.failure_limit, 3);
        assert_eq!(settings.progression.rounds_per_level, 3);
        assert_eq!(settings.scoring.perfect_level_bonus, 1000);
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let mut settings = Settings::default();
        settings.progression.max_level = 0;
        assert_eq!(settings.validate(), Err(ConfigError::MaxLevelZero));
    }

    #[test]
    fn test_inverted_mass_rejected() {
        let mut settings = Settings::default();
        settings.spawn.mass = FloatRange::new(3.0, 1.0);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvertedRange { name: "mass", .. })
        ));
    }

    #[test]
    fn test_negative_timing_rejected() {
        let mut settings = Settings::default();
        settings.timings.failure_notice = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { name: "failure_notice", .. })
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        let err = Settings::from_json(r#"{ "progression": { "rounds_per_level": 0 } }"#);
        assert!(matches!(
            err,
            Err(SettingsError::Invalid(ConfigError::RoundsPerLevelZero))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_fallback_none() {
        let mut settings = Settings::default();
        settings.scoring.accuracy_fallback = None;
        let json = settings.to_json().unwrap();
        let back = Settings::from_json(&json).unwrap();
        assert_eq!(back.scoring.accuracy_fallback, None);
    }

    #[test]
    fn test_sequence_totals() {
        let t = SequenceTimings::default();
        assert!((t.success_total() - 4.5).abs() < 1e-6);
        assert!((t.failure_total() - 2.0).abs() < 1e-6);
        assert!((t.level_total() - 5.0).abs() < 1e-6);
        assert_eq!(SequenceTimings::instant().success_total(), 0.0);
    }
}
