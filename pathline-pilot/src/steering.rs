//! PD steering law with fork override and lost-line saturation

use pathline_core::{ForkSide, SteeringParams};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringCommand {
    /// Bounded by `max_turn_correction`
    pub turn: f64,
    /// Position the law acted on, after the lost-line substitution
    pub position: f64,
    pub line_lost: bool,
    pub fork_turn: bool,
}

#[derive(Debug, Clone)]
pub struct SteeringController {
    p_gain: f64,
    d_gain: f64,
    max_turn_correction: f64,
    turn_at_fork: f64,
    side: ForkSide,
    last_line_position: f64,
    // Position as of the previous distinct tick; the derivative is taken against it
    reference_position: f64,
    last_tick: Option<Instant>,
}

impl SteeringController {
    pub fn new(params: &SteeringParams) -> Self {
        Self {
            p_gain: params.p_gain,
            d_gain: params.d_gain,
            max_turn_correction: params.max_turn_correction,
            turn_at_fork: params.turn_at_fork,
            side: params.preferred_fork_side,
            last_line_position: 0.0,
            reference_position: 0.0,
            last_tick: None,
        }
    }

    pub fn last_line_position(&self) -> f64 {
        self.last_line_position
    }

    /// Compute the command for the tick at `now`
    ///
    /// `position` is `None` when the line has been lost; the law then acts on
    /// the side the line was last seen on, or on 0 when it was never seen.
    /// On a fork tick the output is the fixed fork turn, but the position
    /// memory still advances.
    pub fn tick(&mut self, position: Option<f64>, fork_event: bool, now: Instant) -> SteeringCommand {
        if self.last_tick != Some(now) {
            self.reference_position = self.last_line_position;
            self.last_tick = Some(now);
        }

        let line_lost = position.is_none();
        let position = position.unwrap_or_else(|| saturate(self.reference_position));

        let turn = if fork_event {
            self.side.sign() * self.turn_at_fork
        } else {
            self.pd(position)
        };
        self.last_line_position = position;

        SteeringCommand {
            turn,
            position,
            line_lost,
            fork_turn: fork_event,
        }
    }

    pub fn reset(&mut self) {
        self.last_line_position = 0.0;
        self.reference_position = 0.0;
        self.last_tick = None;
    }

    fn pd(&self, position: f64) -> f64 {
        let raw = self.p_gain * position - self.d_gain * (position - self.reference_position);
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(-self.max_turn_correction, self.max_turn_correction)
    }
}

/// -1, 0 or 1; zero stays zero
fn saturate(position: f64) -> f64 {
    if position > 0.0 {
        1.0
    } else if position < 0.0 {
        -1.0
    } else {
        0.0
    }
}
