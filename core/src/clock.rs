//! Session clock: the tick counter and the session budget.

use crate::types::Tick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClock {
    pub current_tick:            Tick,
    pub session_remaining_ticks: Tick,
}

impl SessionClock {
    pub fn new(session_ticks: Tick) -> Self {
        Self {
            current_tick: 0,
            session_remaining_ticks: session_ticks,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if the session is exhausted; callers check `can_afford` first.
    pub fn advance(&mut self) -> Tick {
        assert!(
            self.session_remaining_ticks > 0,
            "advance() called on exhausted session"
        );
        self.current_tick += 1;
        self.session_remaining_ticks -= 1;
        self.current_tick
    }

    /// Whether an action needing `cost` ticks may start.
    /// A finished session cannot start anything, not even free actions.
    pub fn can_afford(&self, cost: Tick) -> bool {
        self.session_remaining_ticks > 0 && cost <= self.session_remaining_ticks
    }

    pub fn is_exhausted(&self) -> bool {
        self.session_remaining_ticks == 0
    }
}
