//! Rectangular play area with seeded spawn placement

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::EntityPlacementProvider;
use crate::consts::SPAWN_MARGIN;
use crate::settings::SpawnSettings;

#[derive(Debug, Clone)]
pub struct PlayArea {
    min: Vec2,
    max: Vec2,
    rng: Pcg32,
}

impl PlayArea {
    pub fn new(min: Vec2, max: Vec2, seed: u64) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_settings(settings: &SpawnSettings, seed: u64) -> Self {
        Self::new(settings.play_area_min, settings.play_area_max, seed)
    }

    /// Bounds shrunk by the spawn margin; collapses to the centre when too small
    pub fn spawn_bounds(&self) -> (Vec2, Vec2) {
        let margin = Vec2::splat(SPAWN_MARGIN);
        let lo = self.min + margin;
        let hi = self.max - margin;
        let center = (self.min + self.max) * 0.5;
        let (x0, x1) = if lo.x <= hi.x { (lo.x, hi.x) } else { (center.x, center.x) };
        let (y0, y1) = if lo.y <= hi.y { (lo.y, hi.y) } else { (center.y, center.y) };
        (Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }
}

impl EntityPlacementProvider for PlayArea {
    fn spawn_position(&mut self) -> Vec2 {
        let (lo, hi) = self.spawn_bounds();
        let t = Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>());
        lo + (hi - lo) * t
    }
}
