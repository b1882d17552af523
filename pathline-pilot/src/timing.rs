//! Caller-owned frame timing

use serde::Serialize;
use std::time::{Duration, Instant};

/// Timing figures for one processed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    /// Zero-based count of frames processed with this context
    pub frame_index: u64,
    /// Time since the previous frame
    pub interval: Option<Duration>,
    /// Rate from the previous frame interval alone
    pub instant_fps: Option<f64>,
    /// Rate since the first frame
    pub average_fps: Option<f64>,
}

/// Frame counter and clock memory, passed into each tick
#[derive(Debug, Clone, Default)]
pub struct FrameTiming {
    started: Option<Instant>,
    previous: Option<Instant>,
    frames: u64,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    /// Record a frame processed at `now`
    pub fn record(&mut self, now: Instant) -> FrameStats {
        let started = *self.started.get_or_insert(now);
        let interval = self.previous.map(|prev| now.saturating_duration_since(prev));
        let frame_index = self.frames;

        self.previous = Some(now);
        self.frames += 1;

        let instant_fps = interval.and_then(rate_of_one);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let average_fps = if elapsed > 0.0 {
            Some(frame_index as f64 / elapsed)
        } else {
            None
        };

        FrameStats {
            frame_index,
            interval,
            instant_fps,
            average_fps,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn rate_of_one(interval: Duration) -> Option<f64> {
    let secs = interval.as_secs_f64();
    if secs > 0.0 {
        Some(1.0 / secs)
    } else {
        None
    }
}
