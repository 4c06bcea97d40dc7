//! Input sources
//!
//! Anything that produces button presses for a match implements
//! `InputSource`. The runner polls once per tick and applies the returned
//! events before advancing the simulation.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::{InputEvent, Side};

pub trait InputSource {
    /// Events to apply before tick `tick` runs
    fn poll(&mut self, tick: u64) -> Vec<InputEvent>;
}

/// One timed entry of a recorded script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at: u64,
    pub input: InputEvent,
}

/// Fixed list of inputs, replayed by tick
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    queue: VecDeque<ScriptedEvent>,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<ScriptedEvent>) -> Self {
        // Stable, so same-tick entries keep their order
        events.sort_by_key(|e| e.at);
        Self {
            queue: events.into(),
        }
    }

    /// Parse a JSON array of `{ "at": tick, "input": ... }` entries
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let events: Vec<ScriptedEvent> = serde_json::from_str(json)?;
        Ok(Self::new(events))
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, tick: u64) -> Vec<InputEvent> {
        let mut due = Vec::new();
        while let Some(event) = self.queue.front() {
            if event.at > tick {
                break;
            }
            due.push(event.input);
            self.queue.pop_front();
        }
        due
    }
}

/// Seeded button mashing for both sides
///
/// Each tick a released button is pressed with probability `press_chance`
/// and held for `hold_ticks` before being released again.
#[derive(Debug, Clone)]
pub struct RandomPresses {
    rng: Pcg32,
    press_chance: f64,
    hold_ticks: u64,
    release_at: [Option<u64>; 2],
}

impl RandomPresses {
    pub fn new(seed: u64, press_chance: f64, hold_ticks: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            press_chance: if press_chance.is_nan() { 0.0 } else { press_chance.clamp(0.0, 1.0) },
            hold_ticks: hold_ticks.max(1),
            release_at: [None, None],
        }
    }
}

impl InputSource for RandomPresses {
    fn poll(&mut self, tick: u64) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for side in Side::BOTH {
            let slot = &mut self.release_at[side.index()];
            match *slot {
                Some(at) if tick >= at => {
                    *slot = None;
                    events.push(InputEvent::FireUp(side));
                }
                Some(_) => {}
                None => {
                    if self.rng.random_bool(self.press_chance) {
                        *slot = Some(tick.saturating_add(self.hold_ticks));
                        events.push(InputEvent::FireDown(side));
                    }
                }
            }
        }
        events
    }
}
