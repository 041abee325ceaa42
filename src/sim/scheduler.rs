//! Round spawn scheduler
//!
//! Runs the anticipation -> spawn signal -> ball launch sequence for one round
//! attempt. Pure: emits `SpawnEvent`s into a buffer and never touches
//! collaborators. All waits are on the scaled (simulation) clock.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::difficulty::{DifficultyParameterSet, FloatRange};
use super::timeline::Timeline;
use crate::rotate_degrees;
use crate::settings::SpawnSettings;

/// Launch directions before variance is applied: axes first, then diagonals
pub const PREFERRED_DIRECTIONS: [Vec2; 8] = [
    Vec2::X,
    Vec2::NEG_X,
    Vec2::Y,
    Vec2::NEG_Y,
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// Where the spawn sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPhase {
    Idle,
    Anticipating,
    SignalEmitted,
    EntityLaunched,
}

/// Everything needed to create and launch one ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchRequest {
    pub position: Vec2,
    /// Unit vector
    pub direction: Vec2,
    pub speed: f32,
    pub mass: f32,
    pub bounciness: f32,
    pub gravity_scale: f32,
}

/// Output of `RoundScheduler::tick`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnEvent {
    /// Show the spawn telegraph at `position` for `lifespan` seconds
    Signal { position: Vec2, lifespan: f32 },
    /// Create the ball
    Launch(LaunchRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Signal,
    Launch,
}

/// Pick one of the preferred directions and rotate it by up to `variance_degrees`
pub fn sample_direction<R: Rng + ?Sized>(rng: &mut R, variance_degrees: f32) -> Vec2 {
    let base = PREFERRED_DIRECTIONS[rng.random_range(0..PREFERRED_DIRECTIONS.len())];
    let angle = FloatRange::new(-variance_degrees, variance_degrees).sample(rng);
    rotate_degrees(base, angle)
}

#[derive(Debug, Clone)]
pub struct RoundScheduler {
    phase: SpawnPhase,
    /// Open from `start_round` until `end_round`; outlives the spawn sequence
    round_open: bool,
    round_started_at: f64,
    position: Vec2,
    params: DifficultyParameterSet,
    signal_lifespan: f32,
    direction_variance: f32,
    randomize_direction: bool,
    mass: FloatRange,
    rng: Pcg32,
    timeline: Timeline<Step>,
    total_spawned: u32,
}

impl RoundScheduler {
    pub fn new(settings: &SpawnSettings, params: DifficultyParameterSet, seed: u64) -> Self {
        Self {
            phase: SpawnPhase::Idle,
            round_open: false,
            round_started_at: 0.0,
            position: Vec2::ZERO,
            params,
            signal_lifespan: settings.signal_lifespan,
            direction_variance: settings.direction_variance,
            randomize_direction: settings.randomize_direction,
            mass: settings.mass,
            rng: Pcg32::seed_from_u64(seed),
            timeline: Timeline::new(),
            total_spawned: 0,
        }
    }

    /// When `false` every ball launches along +X
    pub fn with_randomized_direction(mut self, randomize: bool) -> Self {
        self.randomize_direction = randomize;
        self
    }

    /// Replace the difficulty parameters used by the next spawn
    pub fn configure(&mut self, params: DifficultyParameterSet) {
        self.params = params;
    }

    /// Begin the spawn sequence at `position`. Refused while a round is open.
    pub fn start_round(&mut self, now: f64, position: Vec2) -> bool {
        if self.round_open || self.phase != SpawnPhase::Idle {
            log::warn!("RoundScheduler: round already active, ignoring start");
            return false;
        }

        self.round_open = true;
        self.round_started_at = now;
        self.position = position;
        self.phase = SpawnPhase::Anticipating;

        let anticipation = self.params.anticipation.sample(&mut self.rng);
        self.timeline.begin(now);
        self.timeline.schedule(anticipation, Step::Signal);

        log::info!(
            "RoundScheduler: ball will spawn at ({:.2}, {:.2}) after {:.2}s anticipation",
            position.x,
            position.y,
            anticipation
        );
        true
    }

    /// Close the round and cancel any pending spawn step
    pub fn end_round(&mut self, now: f64) -> bool {
        if !self.round_open && self.phase == SpawnPhase::Idle {
            log::warn!("RoundScheduler: no active round to end");
            return false;
        }

        log::info!(
            "RoundScheduler: round ended after {:.1}s",
            self.round_timer(now)
        );
        self.timeline.cancel();
        self.phase = SpawnPhase::Idle;
        self.round_open = false;
        true
    }

    /// Fire due steps up to `now` (scaled clock)
    pub fn tick(&mut self, now: f64, out: &mut Vec<SpawnEvent>) {
        while let Some(step) = self.timeline.poll(now) {
            match step {
                Step::Signal => {
                    self.phase = SpawnPhase::SignalEmitted;
                    out.push(SpawnEvent::Signal {
                        position: self.position,
                        lifespan: self.signal_lifespan,
                    });
                    self.timeline.schedule(self.signal_lifespan, Step::Launch);
                    log::debug!("RoundScheduler: spawn signal emitted");
                }
                Step::Launch => {
                    self.phase = SpawnPhase::EntityLaunched;
                    let request = self.sample_launch();
                    self.total_spawned += 1;
                    out.push(SpawnEvent::Launch(request));
                    log::info!(
                        "RoundScheduler: ball launched at ({:.2}, {:.2}) speed {:.2}",
                        request.position.x,
                        request.position.y,
                        request.speed
                    );
                    self.phase = SpawnPhase::Idle;
                }
            }
        }
    }

    fn sample_launch(&mut self) -> LaunchRequest {
        let direction = if self.randomize_direction {
            sample_direction(&mut self.rng, self.direction_variance)
        } else {
            Vec2::X
        };
        LaunchRequest {
            position: self.position,
            direction,
            speed: self.params.velocity.sample(&mut self.rng),
            mass: self.mass.sample(&mut self.rng),
            bounciness: self.params.bounciness.sample(&mut self.rng),
            gravity_scale: self.params.gravity.sample(&mut self.rng),
        }
    }

    pub fn phase(&self) -> SpawnPhase {
        self.phase
    }

    /// True from `start_round` until `end_round`
    pub fn is_round_open(&self) -> bool {
        self.round_open
    }

    /// Seconds since the open round started (0 when closed)
    pub fn round_timer(&self, now: f64) -> f64 {
        if self.round_open {
            now - self.round_started_at
        } else {
            0.0
        }
    }

    pub fn params(&self) -> &DifficultyParameterSet {
        &self.params
    }

    /// Balls launched since construction or `reset_spawn_count`
    pub fn total_spawned(&self) -> u32 {
        self.total_spawned
    }

    pub fn reset_spawn_count(&mut self) {
        self.total_spawned = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DifficultySettings;

    fn scheduler(seed: u64) -> RoundScheduler {
        RoundScheduler::new(
            &SpawnSettings::default(),
            DifficultySettings::default().base,
            seed,
        )
    }

    fn run(s: &mut RoundScheduler, until: f64) -> Vec<SpawnEvent> {
        let mut out = Vec::new();
        let mut t = 0.0;
        while t <= until {
            s.tick(t, &mut out);
            t += 0.05;
        }
        out
    }

    #[test]
    fn test_full_sequence() {
        let mut s = scheduler(1);
        assert!(s.start_round(0.0, Vec2::new(1.0, 2.0)));
        assert_eq!(s.phase(), SpawnPhase::Anticipating);

        // Anticipation is at most 1.8s, signal lifespan 1s
        let events = run(&mut s, 3.0);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            SpawnEvent::Signal { lifespan, .. } if lifespan == 1.0
        ));
        match events[1] {
            SpawnEvent::Launch(req) => {
                assert_eq!(req.position, Vec2::new(1.0, 2.0));
                assert!((req.direction.length() - 1.0).abs() < 1e-4);
                assert!(s.params().velocity.contains(req.speed));
                assert!(s.params().bounciness.contains(req.bounciness));
                assert!(s.params().gravity.contains(req.gravity_scale));
                assert!((0.5..=2.0).contains(&req.mass));
            }
            other => panic!("expected launch, got {other:?}"),
        }
        assert_eq!(s.phase(), SpawnPhase::Idle);
        assert!(s.is_round_open());
        assert_eq!(s.total_spawned(), 1);
    }

    #[test]
    fn test_signal_waits_for_anticipation() {
        let mut s = scheduler(2);
        s.start_round(0.0, Vec2::ZERO);
        let mut out = Vec::new();
        // Minimum anticipation at level 1 is 1.2s
        s.tick(1.1, &mut out);
        assert!(out.is_empty());
        assert_eq!(s.phase(), SpawnPhase::Anticipating);
        s.tick(1.8, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(s.phase(), SpawnPhase::SignalEmitted);
    }

    #[test]
    fn test_start_refused_while_open() {
        let mut s = scheduler(3);
        assert!(s.start_round(0.0, Vec2::ZERO));
        assert!(!s.start_round(0.1, Vec2::ONE));
        run(&mut s, 4.0);
        // Ball launched but round still open until end_round
        assert!(!s.start_round(4.0, Vec2::ONE));
        assert!(s.end_round(4.0));
        assert!(s.start_round(4.0, Vec2::ONE));
    }

    #[test]
    fn test_end_round_cancels_pending_launch() {
        let mut s = scheduler(4);
        s.start_round(0.0, Vec2::ZERO);
        let mut out = Vec::new();
        s.tick(1.9, &mut out);
        assert_eq!(s.phase(), SpawnPhase::SignalEmitted);
        assert!(s.end_round(2.0));
        out.clear();
        s.tick(10.0, &mut out);
        assert!(out.is_empty());
        assert_eq!(s.total_spawned(), 0);
    }

    #[test]
    fn test_end_round_when_idle_is_noop() {
        let mut s = scheduler(5);
        assert!(!s.end_round(0.0));
        s.start_round(0.0, Vec2::ZERO);
        assert!(s.end_round(0.5));
        assert!(!s.end_round(0.6));
    }

    #[test]
    fn test_same_seed_same_launch() {
        let mut a = scheduler(42);
        let mut b = scheduler(42);
        a.start_round(0.0, Vec2::ZERO);
        b.start_round(0.0, Vec2::ZERO);
        assert_eq!(run(&mut a, 4.0), run(&mut b, 4.0));
    }

    #[test]
    fn test_direction_within_variance() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..200 {
            let dir = sample_direction(&mut rng, 30.0);
            let closest = PREFERRED_DIRECTIONS
                .iter()
                .map(|p| p.angle_to(dir).abs().to_degrees())
                .fold(f32::MAX, f32::min);
            assert!(closest <= 30.0 + 1e-3, "direction {dir:?} off by {closest}");
        }
    }

    #[test]
    fn test_fixed_direction_when_not_randomized() {
        let mut s = scheduler(6).with_randomized_direction(false);
        s.start_round(0.0, Vec2::ZERO);
        let events = run(&mut s, 4.0);
        assert!(matches!(events[1], SpawnEvent::Launch(req) if req.direction == Vec2::X));
    }

    #[test]
    fn test_round_timer() {
        let mut s = scheduler(7);
        assert_eq!(s.round_timer(5.0), 0.0);
        s.start_round(1.0, Vec2::ZERO);
        assert!((s.round_timer(3.5) - 2.5).abs() < 1e-9);
        s.end_round(4.0);
        assert_eq!(s.round_timer(5.0), 0.0);
    }
}
