//! Ball Catch - round/level progression core for a ball-catching arcade game
//!
//! Core modules:
//! - `sim`: Deterministic progression (difficulty curve, round scheduler, scoring, state machine)
//! - `platform`: Collaborator traits the core calls out to (spawning, notifications, VFX, theme)
//! - `persistence`: Best score storage
//! - `settings`: Data-driven game balance
//! - `highscores`: Local leaderboard

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SettingsError};
pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed driver timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Round score = round * level * this
    pub const ROUND_SCORE_UNIT: u64 = 500;
    /// Level completion bonus = level * this
    pub const LEVEL_BONUS_UNIT: u64 = 100;

    /// Overlap ratio substituted when the collector reports 0 (degenerate collider)
    pub const ACCURACY_FALLBACK_RATIO: f32 = 0.8;

    /// Margin kept between spawn points and the play area edge
    pub const SPAWN_MARGIN: f32 = 0.5;
}

/// Linear interpolation between `a` and `b`. Exact at both endpoints.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

/// Rotate a direction by `degrees` counter-clockwise
#[inline]
pub fn rotate_degrees(dir: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 8.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 8.0, 1.0), 8.0);
        assert!((lerp(2.0, 8.0, 0.5) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_lands_on_target() {
        // Descending ranges used by the difficulty curve
        assert_eq!(lerp(1.2, 0.2, 1.0), 0.2);
        assert_eq!(lerp(0.8, 0.2, 1.0), 0.2);
        assert_eq!(lerp(1.8, 0.5, 1.0), 0.5);
        assert_eq!(lerp(1.2, 0.2, 1.5), 0.2);
        assert_eq!(lerp(1.2, 0.2, -0.5), 1.2);
    }

    #[test]
    fn test_rotate_degrees() {
        let up = rotate_degrees(Vec2::X, 90.0);
        assert!((up - Vec2::Y).length() < 1e-5);
        let back = rotate_degrees(up, -90.0);
        assert!((back - Vec2::X).length() < 1e-5);
    }
}
