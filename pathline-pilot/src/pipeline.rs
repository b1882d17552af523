//! Per-frame control tick: raw frame in, bounded steering command out

use crate::error::PilotError;
use crate::fork::ForkDetector;
use crate::steering::SteeringController;
use crate::timing::{FrameStats, FrameTiming};
use parking_lot::Mutex;
use pathline_core::{percent_to_index, SteeringParams};
use pathline_eye::{
    ChannelExtractor, ColumnProximityEstimator, Frame, LineFix, LineTracker, VisionError,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Output of one `process` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Within `[-max_turn_correction, max_turn_correction]`
    pub steering: f64,
    /// Fraction of dark samples in the proximity column, in [0, 1]
    pub wall_closeness: f64,
    pub fork_event: bool,
    /// Line fix the command was computed from
    pub line: LineFix,
    /// Segments seen at the read row on this frame
    pub segment_count: usize,
    pub timing: FrameStats,
}

/// Vision and control state for one camera stream
///
/// Not internally synchronized; wrap in [`SharedPipeline`] when frames arrive
/// on more than one thread.
pub struct LinePipeline {
    params: SteeringParams,
    width: usize,
    height: usize,
    tracker: LineTracker,
    proximity: ColumnProximityEstimator,
    proximity_column: usize,
    fork: ForkDetector,
    steering: SteeringController,
    line_lost: bool,
}

impl LinePipeline {
    /// Validate `params` and build a pipeline for `width x height` frames
    pub fn new(params: SteeringParams, width: usize, height: usize) -> Result<Self, PilotError> {
        params.validate()?;
        let tracker = LineTracker::new(&params, width, height)?;
        let proximity_column = percent_to_index(width, params.proximity.column_percent);

        info!(
            "Line pipeline ready for {}x{} frames, proximity column {}",
            width, height, proximity_column
        );

        Ok(Self {
            proximity: ColumnProximityEstimator::new(params.proximity.threshold),
            fork: ForkDetector::from_params(&params),
            steering: SteeringController::new(&params),
            params,
            width,
            height,
            tracker,
            proximity_column,
            line_lost: false,
        })
    }

    /// Process one frame, reading the monotonic clock once
    pub fn process(
        &mut self,
        frame: &Frame<'_>,
        timing: &mut FrameTiming,
    ) -> Result<TickOutput, PilotError> {
        self.process_at(frame, timing, Instant::now())
    }

    /// Process one frame as the tick at `now`
    pub fn process_at(
        &mut self,
        frame: &Frame<'_>,
        timing: &mut FrameTiming,
        now: Instant,
    ) -> Result<TickOutput, PilotError> {
        if frame.width() != self.width || frame.height() != self.height {
            warn!(
                "Rejected {}x{} frame, pipeline expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
            return Err(VisionError::Format(format!(
                "Frame is {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            ))
            .into());
        }

        let planes = ChannelExtractor::split(frame).map_err(|e| {
            warn!("Rejected frame: {}", e);
            e
        })?;

        let read = self.tracker.update(&planes)?;
        let segment_count = read.current_count();
        let line = read.fix(self.params.preferred_fork_side);

        let wall_closeness = planes
            .y
            .column(self.proximity_column)
            .map_or(0.0, |column| self.proximity.estimate(column));

        let fork_event = self.fork.evaluate(segment_count, now);
        let command = self.steering.tick(line.position(), fork_event, now);
        self.note_line_state(&line);

        Ok(TickOutput {
            steering: command.turn,
            wall_closeness,
            fork_event,
            line,
            segment_count,
            timing: timing.record(now),
        })
    }

    pub fn params(&self) -> &SteeringParams {
        &self.params
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn tracker(&self) -> &LineTracker {
        &self.tracker
    }

    pub fn fork_detector(&self) -> &ForkDetector {
        &self.fork
    }

    pub fn steering(&self) -> &SteeringController {
        &self.steering
    }

    pub fn proximity_column(&self) -> usize {
        self.proximity_column
    }

    /// True while the read row has not found a line since construction or reset
    pub fn is_line_lost(&self) -> bool {
        self.line_lost
    }

    /// Drop all tracking, fork and derivative memory
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.fork.reset();
        self.steering.reset();
        self.line_lost = false;
    }

    fn note_line_state(&mut self, line: &LineFix) {
        match (line.is_lost(), self.line_lost) {
            (true, false) => {
                warn!(
                    "No line found yet on read row {}, steering straight",
                    self.tracker.read_row().row()
                );
                self.line_lost = true;
            }
            (false, true) => {
                info!("Line reacquired at {:?}", line.position());
                self.line_lost = false;
            }
            _ => {}
        }
    }
}

struct Shared {
    pipeline: LinePipeline,
    timing: FrameTiming,
}

/// Mutex-serialized pipeline for hosts that deliver frames on several threads
#[derive(Clone)]
pub struct SharedPipeline {
    inner: Arc<Mutex<Shared>>,
}

impl SharedPipeline {
    pub fn new(pipeline: LinePipeline) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared {
                pipeline,
                timing: FrameTiming::new(),
            })),
        }
    }

    /// Process one frame; the clock is read while holding the lock
    pub fn process(&self, frame: &Frame<'_>) -> Result<TickOutput, PilotError> {
        let mut guard = self.inner.lock();
        let Shared { pipeline, timing } = &mut *guard;
        pipeline.process(frame, timing)
    }

    pub fn process_at(&self, frame: &Frame<'_>, now: Instant) -> Result<TickOutput, PilotError> {
        let mut guard = self.inner.lock();
        let Shared { pipeline, timing } = &mut *guard;
        pipeline.process_at(frame, timing, now)
    }

    /// Frames processed so far
    pub fn frames(&self) -> u64 {
        self.inner.lock().timing.frames()
    }

    /// Run `f` with exclusive access to the pipeline
    pub fn with<R>(&self, f: impl FnOnce(&mut LinePipeline) -> R) -> R {
        f(&mut self.inner.lock().pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathline_core::Channel;
    use std::time::Duration;

    const W: usize = 40;
    const H: usize = 20;

    fn frame_bytes(dark: &[std::ops::Range<usize>]) -> Vec<u8> {
        let (cw, ch) = (W / 2, H / 2);
        let mut data = vec![200u8; W * H + 2 * cw * ch];
        for y in 0..ch {
            for range in dark {
                for x in range.clone() {
                    data[W * H + y * cw + x] = 30;
                }
            }
        }
        data
    }

    fn pipeline() -> LinePipeline {
        LinePipeline::new(SteeringParams::default(), W, H).unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = SteeringParams {
            p_gain: -1.0,
            ..SteeringParams::default()
        };
        let err = LinePipeline::new(params, W, H).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_odd_geometry_at_construction() {
        let err = LinePipeline::new(SteeringParams::default(), 41, H).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_mismatched_frame() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let data = vec![0u8; 8 * 4 * 3 / 2];
        let err = pipeline
            .process(&Frame::new(&data, 8, 4), &mut timing)
            .err()
            .unwrap();
        assert!(err.is_format());
        assert_eq!(timing.frames(), 0);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let data = frame_bytes(&[]);
        let err = pipeline
            .process(&Frame::new(&data[..data.len() - 10], W, H), &mut timing)
            .err()
            .unwrap();
        assert!(err.is_format());
    }

    #[test]
    fn test_centered_line_steers_straight() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let data = frame_bytes(&[8..12]);
        let out = pipeline.process(&Frame::new(&data, W, H), &mut timing).unwrap();
        assert_eq!(out.segment_count, 1);
        assert_eq!(out.line.position(), Some(0.0));
        assert_eq!(out.steering, 0.0);
        assert!(!out.fork_event);
        assert_eq!(out.timing.frame_index, 0);
    }

    #[test]
    fn test_wall_closeness_from_luma_column() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let mut data = frame_bytes(&[8..12]);
        let column = pipeline.proximity_column();
        for y in 0..5 {
            data[y * W + column] = 0;
        }
        let out = pipeline.process(&Frame::new(&data, W, H), &mut timing).unwrap();
        assert!((out.wall_closeness - 5.0 / H as f64).abs() < 1e-12);
    }

    #[test]
    fn test_fork_fires_and_turns() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let data = frame_bytes(&[1..5, 14..18]);
        let frame = Frame::new(&data, W, H);
        let t0 = Instant::now();

        let first = pipeline.process_at(&frame, &mut timing, t0).unwrap();
        assert!(!first.fork_event);
        assert_eq!(first.segment_count, 2);

        let fired = pipeline
            .process_at(&frame, &mut timing, t0 + Duration::from_millis(30))
            .unwrap();
        assert!(fired.fork_event);
        assert_eq!(fired.steering, -0.25);

        let after = pipeline
            .process_at(&frame, &mut timing, t0 + Duration::from_millis(60))
            .unwrap();
        assert!(!after.fork_event);
    }

    #[test]
    fn test_luma_channel_tracking() {
        let params = SteeringParams {
            channel: Channel::Y,
            ..SteeringParams::default()
        };
        let mut pipeline = LinePipeline::new(params, W, H).unwrap();
        let mut timing = FrameTiming::new();
        let mut data = frame_bytes(&[]);
        for y in 0..H {
            for x in 30..36 {
                data[y * W + x] = 10;
            }
        }
        let out = pipeline.process(&Frame::new(&data, W, H), &mut timing).unwrap();
        // (30 + 36) / 40 - 1
        assert!((out.line.position().unwrap() - 0.65).abs() < 1e-12);
        assert!(out.steering > 0.0);
    }

    #[test]
    fn test_line_lost_only_before_first_sighting() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let blank = frame_bytes(&[]);
        let seen = frame_bytes(&[14..18]);

        let out = pipeline.process(&Frame::new(&blank, W, H), &mut timing).unwrap();
        assert!(out.line.is_lost());
        assert_eq!(out.steering, 0.0);
        assert!(pipeline.is_line_lost());

        pipeline.process(&Frame::new(&seen, W, H), &mut timing).unwrap();
        assert!(!pipeline.is_line_lost());

        // Held afterwards, never lost again
        let out = pipeline.process(&Frame::new(&blank, W, H), &mut timing).unwrap();
        assert!(matches!(out.line, LineFix::Held(_)));
        assert!(!pipeline.is_line_lost());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pipeline = pipeline();
        let mut timing = FrameTiming::new();
        let data = frame_bytes(&[14..18]);
        pipeline.process(&Frame::new(&data, W, H), &mut timing).unwrap();
        pipeline.reset();
        assert!(pipeline.tracker().read_row().held().is_none());
        assert_eq!(pipeline.steering().last_line_position(), 0.0);
    }

    #[test]
    fn test_shared_pipeline_across_threads() {
        let shared = SharedPipeline::new(pipeline());
        let data = Arc::new(frame_bytes(&[8..12]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let data = data.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let out = shared.process(&Frame::new(&data, W, H)).unwrap();
                        assert!(out.steering.abs() <= 0.25);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.frames(), 40);
        assert_eq!(shared.with(|p| p.dimensions()), (W, H));
    }
}
