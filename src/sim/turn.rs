//! Turn coordinator
//!
//! Each side gets one shot per round. Once both have fired, nobody may fire
//! until every projectile from the round (split children included) is gone
//! and a short cooldown has run; then both guns come back together.

use serde::{Deserialize, Serialize};

use super::state::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// Both sides armed
    Idle,
    /// `first` has fired; only the other side may fire
    AwaitingSecond { first: Side },
    /// Both fired; waiting for the arena to clear plus the cooldown
    CoolingDown {
        first: Side,
        both_fired_at: u64,
        /// Tick the arena was first seen empty (reset if anything reappears)
        cleared_at: Option<u64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnCoordinator {
    state: TurnState,
    cooldown: u64,
}

impl TurnCoordinator {
    pub fn new(cooldown: u64) -> Self {
        Self {
            state: TurnState::Idle,
            cooldown,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Side that opened the current round, if anyone has fired
    pub fn first_shooter(&self) -> Option<Side> {
        match self.state {
            TurnState::Idle => None,
            TurnState::AwaitingSecond { first } | TurnState::CoolingDown { first, .. } => Some(first),
        }
    }

    /// Side that answered, once both have fired
    pub fn second_shooter(&self) -> Option<Side> {
        match self.state {
            TurnState::CoolingDown { first, .. } => Some(first.opponent()),
            _ => None,
        }
    }

    pub fn can_fire(&self, side: Side) -> bool {
        match self.state {
            TurnState::Idle => true,
            TurnState::AwaitingSecond { first } => side != first,
            TurnState::CoolingDown { .. } => false,
        }
    }

    /// Register a shot; `false` (and no state change) if `side` may not fire
    pub fn record_fire(&mut self, side: Side, now: u64) -> bool {
        self.state = match self.state {
            TurnState::Idle => TurnState::AwaitingSecond { first: side },
            TurnState::AwaitingSecond { first } if side != first => TurnState::CoolingDown {
                first,
                both_fired_at: now,
                cleared_at: None,
            },
            _ => return false,
        };
        true
    }

    /// Advance the reload check; returns `true` on the tick guns come back
    pub fn update(&mut self, now: u64, arena_clear: bool) -> bool {
        let TurnState::CoolingDown {
            first,
            both_fired_at,
            cleared_at,
        } = self.state
        else {
            return false;
        };

        if !arena_clear {
            if cleared_at.is_some() {
                self.state = TurnState::CoolingDown {
                    first,
                    both_fired_at,
                    cleared_at: None,
                };
            }
            return false;
        }

        let since = cleared_at.unwrap_or(now);
        if now.saturating_sub(since) >= self.cooldown {
            self.state = TurnState::Idle;
            return true;
        }

        self.state = TurnState::CoolingDown {
            first,
            both_fired_at,
            cleared_at: Some(since),
        };
        false
    }

    pub fn reset(&mut self) {
        self.state = TurnState::Idle;
    }
}
