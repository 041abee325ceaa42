//! Difficulty curve
//!
//! Maps a level number onto the ranges the round scheduler samples from.
//! Pure and deterministic: the same inputs always produce bit-identical output.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lerp;
use crate::settings::{DifficultySettings, check_range, check_value};

/// Closed interval sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Interpolate both bounds independently
    pub fn lerp(a: FloatRange, b: FloatRange, t: f32) -> Self {
        Self {
            min: lerp(a.min, b.min, t),
            max: lerp(a.max, b.max, t),
        }
    }

    /// Uniform sample in `[min, max]`; degenerate ranges return `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        lerp(self.min, self.max, rng.random::<f32>())
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Shaping applied to level progress before interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    /// Smoothstep, matches an engine-style ease-in-out curve
    EaseInOut,
}

impl Easing {
    /// Map `t` in [0, 1] to [0, 1]; endpoints are fixed
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Easing per parameter group
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveEasing {
    pub velocity: Easing,
    pub anticipation: Easing,
    pub bounciness: Easing,
    pub gravity: Easing,
    pub round_duration: Easing,
}

impl CurveEasing {
    /// Same easing for every parameter
    pub fn uniform(easing: Easing) -> Self {
        Self {
            velocity: easing,
            anticipation: easing,
            bounciness: easing,
            gravity: easing,
            round_duration: easing,
        }
    }
}

/// Gameplay parameters derived from the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParameterSet {
    /// Launch speed
    pub velocity: FloatRange,
    /// Pause before the spawn signal (scaled seconds)
    pub anticipation: FloatRange,
    /// Ball restitution
    pub bounciness: FloatRange,
    /// Ball gravity scale
    pub gravity: FloatRange,
    /// Nominal round length; rounds are not time-limited, this is informational
    pub round_duration: f32,
}

impl DifficultyParameterSet {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_range("velocity", self.velocity)?;
        check_range("anticipation", self.anticipation)?;
        check_range("bounciness", self.bounciness)?;
        check_range("gravity", self.gravity)?;
        check_value("round_duration", self.round_duration)
    }
}

/// Level progress in [0, 1]. `level` is clamped to `[1, max_level]`.
pub fn normalized_level(level: u32, max_level: u32) -> f32 {
    if max_level <= 1 {
        return 0.0;
    }
    let level = level.clamp(1, max_level);
    (level - 1) as f32 / (max_level - 1) as f32
}

/// Interpolate every bound between `base` (level 1) and `max` (`max_level`)
pub fn evaluate(
    level: u32,
    max_level: u32,
    base: &DifficultyParameterSet,
    max: &DifficultyParameterSet,
    easing: &CurveEasing,
) -> DifficultyParameterSet {
    let t = normalized_level(level, max_level);
    DifficultyParameterSet {
        velocity: FloatRange::lerp(base.velocity, max.velocity, easing.velocity.apply(t)),
        anticipation: FloatRange::lerp(
            base.anticipation,
            max.anticipation,
            easing.anticipation.apply(t),
        ),
        bounciness: FloatRange::lerp(base.bounciness, max.bounciness, easing.bounciness.apply(t)),
        gravity: FloatRange::lerp(base.gravity, max.gravity, easing.gravity.apply(t)),
        round_duration: lerp(
            base.round_duration,
            max.round_duration,
            easing.round_duration.apply(t),
        ),
    }
}

/// Configured curve, evaluated on every level change
#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    max_level: u32,
    scaling_enabled: bool,
    base: DifficultyParameterSet,
    max: DifficultyParameterSet,
    easing: CurveEasing,
}

impl DifficultyCurve {
    pub fn new(settings: &DifficultySettings, max_level: u32) -> Self {
        Self {
            max_level: max_level.max(1),
            scaling_enabled: settings.scaling_enabled,
            base: settings.base,
            max: settings.max,
            easing: settings.easing,
        }
    }

    pub fn evaluate(&self, level: u32) -> DifficultyParameterSet {
        if !self.scaling_enabled {
            return self.base;
        }
        evaluate(level, self.max_level, &self.base, &self.max, &self.easing)
    }

    /// Level progress in [0, 1] (0 while scaling is disabled)
    pub fn normalized(&self, level: u32) -> f32 {
        if !self.scaling_enabled {
            return 0.0;
        }
        normalized_level(level, self.max_level)
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn base(&self) -> &DifficultyParameterSet {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn curve() -> DifficultyCurve {
        DifficultyCurve::new(&DifficultySettings::default(), 20)
    }

    #[test]
    fn test_level_one_is_base() {
        let settings = DifficultySettings::default();
        assert_eq!(curve().evaluate(1), settings.base);
    }

    #[test]
    fn test_max_level_is_max() {
        let settings = DifficultySettings::default();
        assert_eq!(curve().evaluate(20), settings.max);
    }

    #[test]
    fn test_level_is_clamped() {
        let c = curve();
        assert_eq!(c.evaluate(0), c.evaluate(1));
        assert_eq!(c.evaluate(99), c.evaluate(20));
    }

    #[test]
    fn test_single_level_curve_uses_base() {
        let settings = DifficultySettings::default();
        let c = DifficultyCurve::new(&settings, 1);
        assert_eq!(c.normalized(1), 0.0);
        assert_eq!(c.evaluate(5), settings.base);
    }

    #[test]
    fn test_scaling_disabled_returns_base() {
        let mut settings = DifficultySettings::default();
        settings.scaling_enabled = false;
        let c = DifficultyCurve::new(&settings, 20);
        assert_eq!(c.evaluate(15), settings.base);
        assert_eq!(c.normalized(15), 0.0);
    }

    #[test]
    fn test_midpoint_is_linear() {
        // 21 levels puts level 11 exactly halfway
        let c = DifficultyCurve::new(&DifficultySettings::default(), 21);
        let mid = c.evaluate(11);
        assert!((mid.velocity.max - 9.5).abs() < 1e-5);
        assert!((mid.round_duration - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_easing_endpoints_fixed() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let range = FloatRange::new(0.5, 2.0);
        for _ in 0..500 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(FloatRange::new(1.0, 1.0).sample(&mut rng), 1.0);
    }

    proptest! {
        #[test]
        fn prop_velocity_max_is_monotonic(a in 1u32..=20, b in 1u32..=20) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let c = curve();
            prop_assert!(c.evaluate(lo).velocity.max <= c.evaluate(hi).velocity.max);
        }

        #[test]
        fn prop_evaluate_is_deterministic(level in 0u32..40, max_level in 1u32..40) {
            let s = DifficultySettings::default();
            let easing = CurveEasing::uniform(Easing::EaseInOut);
            let first = evaluate(level, max_level, &s.base, &s.max, &easing);
            let second = evaluate(level, max_level, &s.base, &s.max, &easing);
            prop_assert_eq!(first.velocity.min.to_bits(), second.velocity.min.to_bits());
            prop_assert_eq!(first.velocity.max.to_bits(), second.velocity.max.to_bits());
            prop_assert_eq!(first.anticipation.min.to_bits(), second.anticipation.min.to_bits());
            prop_assert_eq!(first.round_duration.to_bits(), second.round_duration.to_bits());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_progress_in_unit_interval(level in 0u32..100, max_level in 0u32..100) {
            let t = normalized_level(level, max_level);
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }
}
