//! Ball Catch headless driver
//!
//! Runs one autoplay session with a seeded simulated player and prints a
//! summary. Usage: `ballcatch [settings.json] [--seed N] [--catch-rate P]`

use std::process::ExitCode;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use ballcatch::consts::{MAX_SUBSTEPS, SIM_DT};
use ballcatch::persistence::MemoryStore;
use ballcatch::platform::{LoggingPlatform, Platform, PlayArea};
use ballcatch::sim::{FloatRange, ProgressionStateMachine};
use ballcatch::Settings;

/// Frame time the driver feeds the accumulator (30 fps host)
const FRAME_DT: f32 = 1.0 / 30.0;
/// Give up after this much real time
const MAX_SESSION_SECONDS: f32 = 3600.0;

struct Options {
    settings_path: Option<String>,
    seed: Option<u64>,
    catch_rate: f32,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        settings_path: None,
        seed: None,
        catch_rate: 0.85,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                options.seed = Some(value.parse().map_err(|_| format!("bad seed: {value}"))?);
            }
            "--catch-rate" => {
                let value = args.next().ok_or("--catch-rate needs a value")?;
                let rate: f32 = value
                    .parse()
                    .map_err(|_| format!("bad catch rate: {value}"))?;
                options.catch_rate = rate.clamp(0.0, 1.0);
            }
            path => options.settings_path = Some(path.to_string()),
        }
    }
    Ok(options)
}

/// Seeded stand-in for a human: reacts after a random delay, then either
/// catches the ball with some overlap or lets it escape
struct AutoPlayer {
    rng: Pcg32,
    catch_rate: f32,
    reaction: FloatRange,
    act_at: Option<f64>,
}

impl AutoPlayer {
    fn new(seed: u64, catch_rate: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0x5EED),
            catch_rate,
            reaction: FloatRange::new(0.4, 5.0),
            act_at: None,
        }
    }

    fn update(&mut self, sm: &mut ProgressionStateMachine, ball_in_play: bool) {
        if !sm.is_in_round() || !ball_in_play {
            self.act_at = None;
            return;
        }
        let now = sm.sim_time();
        let act_at = *self
            .act_at
            .get_or_insert_with(|| now + f64::from(self.reaction.sample(&mut self.rng)));
        if now < act_at {
            return;
        }
        self.act_at = None;

        if self.rng.random::<f32>() < self.catch_rate {
            // Occasionally report an unmeasured overlap
            let overlap = if self.rng.random_range(0..10) == 0 {
                0.0
            } else {
                self.rng.random_range(0.5..=1.0)
            };
            sm.on_entity_captured(overlap);
        } else {
            sm.on_capture_failed();
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: ballcatch [settings.json] [--seed N] [--catch-rate P]");
            return ExitCode::FAILURE;
        }
    };

    let mut settings = match &options.settings_path {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Some(seed) = options.seed {
        settings.seed = seed;
    }
    let seed = settings.seed;

    let host = LoggingPlatform::new();
    let store = MemoryStore::new();
    let platform = Platform::new(
        Box::new(PlayArea::from_settings(&settings.spawn, seed)),
        Box::new(host.clone()),
        Box::new(host.clone()),
        Box::new(store.clone()),
        Box::new(host.clone()),
    )
    .with_feedback(Box::new(host.clone()))
    .with_theme(Box::new(host.clone()))
    .with_score_observer(Box::new(host.clone()));

    let mut sm = match ProgressionStateMachine::new(settings, platform) {
        Ok(sm) => sm,
        Err(e) => {
            log::error!("Invalid settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Ball Catch (headless) starting, seed {}", seed);
    if !sm.start() {
        println!("Progression disabled, nothing to play");
        return ExitCode::SUCCESS;
    }

    let mut player = AutoPlayer::new(seed, options.catch_rate);
    let mut accumulator = 0.0f32;
    let mut elapsed = 0.0f32;
    while !sm.is_game_over() && elapsed < MAX_SESSION_SECONDS {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            sm.tick(SIM_DT);
            player.update(&mut sm, host.has_live_entity());
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    let stats = host.stats();
    println!("--- Ball Catch session (seed {seed}) ---");
    match sm.outcome() {
        Some(summary) => println!(
            "{:?} at {} after {:.0}s",
            summary.outcome,
            sm.progression_label(),
            elapsed
        ),
        None => println!("Stopped at {} after {:.0}s", sm.progression_label(), elapsed),
    }
    println!("{}", sm.scoring().session_stats());
    println!(
        "Balls launched: {} | Best score: {}",
        stats.total_launched,
        store.best_score()
    );
    for (rank, entry) in store.high_scores().entries.iter().enumerate() {
        println!(
            "#{} {} (level {}, {} rounds, {:?})",
            rank + 1,
            entry.score,
            entry.level,
            entry.rounds_completed,
            entry.outcome
        );
    }
    ExitCode::SUCCESS
}
