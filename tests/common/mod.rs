//! Shared harness: a platform double that records every call in order

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use ballcatch::Settings;
use ballcatch::platform::{
    EntityHandle, EntityPlacementProvider, EntitySpawner, FeedbackSink, GameOverHandler,
    NotificationSink, PersistenceProvider, Platform, ScoreObserver, ThemeProvider,
};
use ballcatch::sim::{
    Level, LaunchRequest, ProgressionStateMachine, Round, RunOutcome, RunSummary, ScoreUpdate,
};

/// Tick size used by `advance`
pub const DT: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SpawnEntity,
    SpawnAvatar,
    DespawnAvatar,
    ClearAll,
    LevelStarted(u32),
    LevelCompleted(u32),
    LevelFailed(u32),
    RoundStarted(u32, u32),
    RoundCompleted(u32, u32),
    RoundFailed { level: u32, round: u32, failures: u32 },
    GameWon(u32),
    SpawnSignal,
    FailureCue,
    FailureFlash,
    InputSuspended(bool),
    SaveScore(u64),
    RecordRun(RunOutcome),
    Theme(u32),
    GameOver(RunOutcome),
}

#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
    scores: Rc<RefCell<Vec<ScoreUpdate>>>,
    summary: Rc<RefCell<Option<RunSummary>>>,
    best_score: u64,
    next_handle: u32,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.count(call) > 0
    }

    pub fn score_updates(&self) -> Vec<ScoreUpdate> {
        self.scores.borrow().clone()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.borrow().clone()
    }
}

impl EntityPlacementProvider for Recorder {
    fn spawn_position(&mut self) -> Vec2 {
        Vec2::new(1.0, -1.0)
    }
}

impl EntitySpawner for Recorder {
    fn spawn_entity(&mut self, _request: &LaunchRequest) -> EntityHandle {
        self.next_handle += 1;
        self.push(Call::SpawnEntity);
        EntityHandle(self.next_handle)
    }

    fn spawn_avatar(&mut self) {
        self.push(Call::SpawnAvatar);
    }

    fn despawn_avatar(&mut self) {
        self.push(Call::DespawnAvatar);
    }

    fn clear_all_entities(&mut self) {
        self.push(Call::ClearAll);
    }
}

impl NotificationSink for Recorder {
    fn level_started(&mut self, level: &Level) {
        self.push(Call::LevelStarted(level.number));
    }

    fn level_completed(&mut self, level: &Level) {
        self.push(Call::LevelCompleted(level.number));
    }

    fn level_failed(&mut self, level: &Level) {
        self.push(Call::LevelFailed(level.number));
    }

    fn round_started(&mut self, round: &Round) {
        self.push(Call::RoundStarted(round.level_number, round.number));
    }

    fn round_completed(&mut self, round: &Round) {
        self.push(Call::RoundCompleted(round.level_number, round.number));
    }

    fn round_failed(&mut self, round: &Round, failures: u32, _failure_limit: u32) {
        self.push(Call::RoundFailed {
            level: round.level_number,
            round: round.number,
            failures,
        });
    }

    fn game_won(&mut self, level: &Level) {
        self.push(Call::GameWon(level.number));
    }
}

impl FeedbackSink for Recorder {
    fn spawn_signal(&mut self, _position: Vec2, _lifespan: f32) {
        self.push(Call::SpawnSignal);
    }

    fn failure_cue(&mut self) {
        self.push(Call::FailureCue);
    }

    fn failure_flash(&mut self) {
        self.push(Call::FailureFlash);
    }

    fn set_input_suspended(&mut self, suspended: bool) {
        self.push(Call::InputSuspended(suspended));
    }
}

impl PersistenceProvider for Recorder {
    fn load_best_score(&mut self) -> u64 {
        self.best_score
    }

    fn save_score(&mut self, score: u64) {
        self.push(Call::SaveScore(score));
    }

    fn record_run(&mut self, summary: &RunSummary) {
        self.push(Call::RecordRun(summary.outcome));
    }
}

impl ThemeProvider for Recorder {
    fn apply_theme_for_level(&mut self, level: u32) {
        self.push(Call::Theme(level));
    }
}

impl GameOverHandler for Recorder {
    fn game_over(&mut self, summary: &RunSummary) {
        self.push(Call::GameOver(summary.outcome));
        *self.summary.borrow_mut() = Some(summary.clone());
    }
}

impl ScoreObserver for Recorder {
    fn score_changed(&mut self, update: &ScoreUpdate) {
        self.scores.borrow_mut().push(*update);
    }
}

fn platform(recorder: &Recorder) -> Platform {
    Platform::new(
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    )
    .with_feedback(Box::new(recorder.clone()))
    .with_theme(Box::new(recorder.clone()))
    .with_score_observer(Box::new(recorder.clone()))
}

/// Machine wired to a recorder, not yet started
pub fn harness(settings: Settings) -> (ProgressionStateMachine, Recorder) {
    let recorder = Recorder::default();
    let sm = ProgressionStateMachine::new(settings, platform(&recorder))
        .expect("valid settings");
    (sm, recorder)
}

/// Same, with a best score already stored
pub fn harness_with_best(settings: Settings, best_score: u64) -> (ProgressionStateMachine, Recorder) {
    let recorder = Recorder {
        best_score,
        ..Recorder::default()
    };
    let sm = ProgressionStateMachine::new(settings, platform(&recorder))
        .expect("valid settings");
    (sm, recorder)
}

/// Machine with only the required collaborators (no theme, feedback or observer)
pub fn bare_harness(settings: Settings) -> (ProgressionStateMachine, Recorder) {
    let recorder = Recorder::default();
    let platform = Platform::new(
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    );
    let sm = ProgressionStateMachine::new(settings, platform).expect("valid settings");
    (sm, recorder)
}

/// Tick in `DT` steps for roughly `seconds` of real time
pub fn advance(sm: &mut ProgressionStateMachine, seconds: f32) {
    let steps = (seconds / DT).ceil() as u32;
    for _ in 0..steps {
        sm.tick(DT);
    }
}
