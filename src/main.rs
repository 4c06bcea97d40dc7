//! Duel Arena headless runner
//!
//! Plays one match with either a recorded input script or seeded random
//! button presses, and streams snapshots to a text renderer on its own
//! thread.
//!
//! ```text
//! duel-arena [SETTINGS.json] [--ticks N] [--seed N] [--script FILE]
//!            [--stride N] [--realtime] [--save-settings FILE]
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use glam::Vec2;

use duel_arena::MatchSettings;
use duel_arena::audio::{self, AudioManager};
use duel_arena::consts::{MAX_SUBSTEPS, SIM_DT, TICKS_PER_SECOND};
use duel_arena::platform::{InputSource, RandomPresses, ScriptedInput};
use duel_arena::renderer::{Renderer, TextRenderer};
use duel_arena::sim::{Arena, RenderSnapshot};

/// Chance per tick that a released button gets pressed
const PRESS_CHANCE: f64 = 0.02;
const HOLD_TICKS: u64 = 6;

#[derive(Debug, Parser)]
#[command(name = "duel-arena")]
#[command(about = "Headless two-player ricochet duel")]
struct Options {
    /// Match settings JSON (defaults when omitted)
    settings: Option<PathBuf>,

    /// Replay inputs from a JSON script instead of random presses
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write the effective settings to this path before starting
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Stop after this many steps
    #[arg(long, default_value_t = 60 * TICKS_PER_SECOND as u64)]
    ticks: u64,

    /// Override the settings seed
    #[arg(long)]
    seed: Option<u64>,

    /// Draw one snapshot in this many
    #[arg(long, default_value_t = TICKS_PER_SECOND as u64)]
    stride: u64,

    /// Pace the loop to wall-clock time
    #[arg(long)]
    realtime: bool,
}

/// Apply polled input, tick once, route audio and ship the snapshot.
/// Returns `false` once the renderer has hung up.
fn step(
    arena: &mut Arena,
    input: &mut dyn InputSource,
    audio: &mut AudioManager,
    frames: &Sender<RenderSnapshot>,
    step_index: u64,
) -> bool {
    for event in input.poll(step_index) {
        arena.apply(event);
    }
    arena.tick();
    audio::dispatch(&arena.drain_events(), audio);
    frames.send(arena.renderable_state().clone()).is_ok()
}

fn run(options: Options) -> anyhow::Result<()> {
    let mut settings = match &options.settings {
        Some(path) => MatchSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => MatchSettings::default(),
    };
    if options.seed.is_some() {
        settings.seed = options.seed;
    }
    if let Some(path) = &options.save_settings {
        settings
            .save(path)
            .with_context(|| format!("saving settings to {}", path.display()))?;
    }

    let arena_size = Vec2::new(settings.arena_width, settings.arena_height);
    let top_margin = settings.top_margin();
    let mut arena = Arena::try_new(settings)?;
    log::info!("Duel Arena starting (seed {})", arena.seed());

    let mut input: Box<dyn InputSource> = match &options.script {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading input script {}", path.display()))?;
            Box::new(ScriptedInput::from_json(&json).context("parsing input script")?)
        }
        None => Box::new(RandomPresses::new(
            arena.seed().wrapping_add(1),
            PRESS_CHANCE,
            HOLD_TICKS,
        )),
    };
    let mut audio = AudioManager::new();

    let (tx, rx) = mpsc::channel::<RenderSnapshot>();
    let stride = options.stride;
    let render_thread = thread::spawn(move || -> std::io::Result<u64> {
        let mut renderer = TextRenderer::new(std::io::stdout(), arena_size, top_margin)
            .with_grid(100, 30)
            .with_stride(stride);
        for frame in rx {
            renderer.draw(&frame)?;
        }
        Ok(renderer.frames())
    });

    let mut steps = 0;
    if options.realtime {
        let mut accumulator = 0.0f32;
        let mut last = Instant::now();
        'outer: while steps < options.ticks && !arena.is_over() {
            let now = Instant::now();
            accumulator += (now - last).as_secs_f32().min(0.1);
            last = now;

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                if !step(&mut arena, input.as_mut(), &mut audio, &tx, steps) {
                    break 'outer;
                }
                accumulator -= SIM_DT;
                substeps += 1;
                steps += 1;
            }
            thread::sleep(Duration::from_millis(1));
        }
    } else {
        while steps < options.ticks && !arena.is_over() {
            if !step(&mut arena, input.as_mut(), &mut audio, &tx, steps) {
                break;
            }
            steps += 1;
        }
    }
    drop(tx);

    match render_thread.join() {
        Ok(Ok(frames)) => log::debug!("Renderer received {} frames", frames),
        Ok(Err(e)) => log::warn!("Renderer stopped: {}", e),
        Err(_) => log::error!("Renderer thread panicked"),
    }

    match arena.winner() {
        Some(winner) => log::info!(
            "{:?} won {}-{} after {} steps",
            winner,
            arena.score.left,
            arena.score.right,
            steps
        ),
        None => log::info!(
            "Stopped after {} steps at {}-{}",
            steps,
            arena.score.left,
            arena.score.right
        ),
    }
    log::debug!("{} sound cues played", audio.played());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse();
    if let Err(e) = run(options) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
