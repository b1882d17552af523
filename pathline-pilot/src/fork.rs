//! Debounced, one-shot fork detection at the read row

use pathline_core::SteeringParams;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Fork detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPhase {
    /// Waiting for more than one segment at the read row
    Idle,
    /// Several segments seen since `since`; not yet persistent enough to fire
    Tentative { since: Instant },
    /// A fork fired at `fired_at`; no new fork until `fork_timeout` has passed
    Cooldown { fired_at: Instant },
}

/// Turns "more than one segment at the read row" into a single fork event
///
/// The multi-segment condition must persist for `time_threshold` before the
/// event fires, and fires at most once per `timeout`.
#[derive(Debug, Clone)]
pub struct ForkDetector {
    timeout: Duration,
    time_threshold: Duration,
    phase: ForkPhase,
    last_trigger: Option<Instant>,
}

impl ForkDetector {
    pub fn new(timeout: Duration, time_threshold: Duration) -> Self {
        Self {
            timeout,
            time_threshold,
            phase: ForkPhase::Idle,
            last_trigger: None,
        }
    }

    pub fn from_params(params: &SteeringParams) -> Self {
        Self::new(
            params.fork_timeout_duration(),
            params.fork_time_threshold_duration(),
        )
    }

    pub fn phase(&self) -> ForkPhase {
        self.phase
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Feed the read row's segment count for the tick at `now`
    ///
    /// Returns true on the tick the fork fires. Re-evaluating the same instant
    /// with several segments still visible reports that same event again.
    pub fn evaluate(&mut self, segment_count: usize, now: Instant) -> bool {
        let multi = segment_count > 1;

        match self.phase {
            ForkPhase::Idle => {
                self.try_mark(multi, now);
                false
            }
            ForkPhase::Tentative { since } => {
                if !multi {
                    debug!("Fork candidate dropped after {:?}", now.saturating_duration_since(since));
                    self.phase = ForkPhase::Idle;
                    return false;
                }
                if now > since && now.saturating_duration_since(since) >= self.time_threshold {
                    self.phase = ForkPhase::Cooldown { fired_at: now };
                    self.last_trigger = Some(now);
                    info!(
                        "Fork detected: {} segments for {:?}",
                        segment_count,
                        now.saturating_duration_since(since)
                    );
                    return true;
                }
                false
            }
            ForkPhase::Cooldown { fired_at } => {
                if fired_at == now {
                    return multi;
                }
                if !self.cooled_down(now) {
                    return false;
                }
                self.phase = ForkPhase::Idle;
                self.try_mark(multi, now);
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = ForkPhase::Idle;
        self.last_trigger = None;
    }

    fn try_mark(&mut self, multi: bool, now: Instant) {
        if multi && self.cooled_down(now) {
            debug!("Fork candidate marked");
            self.phase = ForkPhase::Tentative { since: now };
        }
    }

    fn cooled_down(&self, now: Instant) -> bool {
        self.last_trigger
            .map_or(true, |t| now.saturating_duration_since(t) >= self.timeout)
    }
}
