//! Per-row line tracking with a hold-last-good policy

use crate::error::VisionError;
use crate::frame::{ChannelExtractor, Planes};
use crate::processing::segmentation::{stretch_contrast, LineSegment, RowResult, RowSegmenter};
use pathline_core::{percent_to_index, Channel, ForkSide, SteeringParams};
use tracing::{debug, info};

/// Where the line is on a tracked row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineFix {
    /// Seen on this frame
    Live(LineSegment),
    /// Not seen on this frame; last segment seen on an earlier frame
    Held(LineSegment),
    /// Never seen on this row
    Lost,
}

impl LineFix {
    pub fn segment(&self) -> Option<&LineSegment> {
        match self {
            LineFix::Live(seg) | LineFix::Held(seg) => Some(seg),
            LineFix::Lost => None,
        }
    }

    pub fn position(&self) -> Option<f64> {
        self.segment().map(|seg| seg.position)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, LineFix::Lost)
    }
}

/// Tracking state of one scan row
#[derive(Debug, Clone)]
pub struct TrackedRow {
    row: usize,
    current: RowResult,
    held: Option<RowResult>,
}

impl TrackedRow {
    fn new(row: usize) -> Self {
        Self {
            row,
            current: RowResult::new(),
            held: None,
        }
    }

    /// Row index within the tracked channel
    pub fn row(&self) -> usize {
        self.row
    }

    /// Segments found on the latest frame, possibly none
    pub fn current(&self) -> &RowResult {
        &self.current
    }

    /// Last non-empty result, `None` until the row has seen a line
    pub fn held(&self) -> Option<&RowResult> {
        self.held.as_ref()
    }

    pub fn current_count(&self) -> usize {
        self.current.len()
    }

    /// Segment to steer by, picking by `side` when several are visible
    pub fn fix(&self, side: ForkSide) -> LineFix {
        if let Some(seg) = self.current.select(side) {
            return LineFix::Live(*seg);
        }
        match self.held.as_ref().and_then(|held| held.select(side)) {
            Some(seg) => LineFix::Held(*seg),
            None => LineFix::Lost,
        }
    }

    fn commit(&mut self) {
        if self.current.is_empty() {
            if self.held.is_some() {
                debug!("Row {} empty, holding last result", self.row);
            }
            return;
        }
        self.held
            .get_or_insert_with(RowResult::new)
            .copy_from(&self.current);
    }

    fn reset(&mut self) {
        self.current = RowResult::new();
        self.held = None;
    }
}

/// Runs the row segmenter over the read row (and any extra rows) every frame
pub struct LineTracker {
    segmenter: RowSegmenter,
    channel: Channel,
    channel_width: usize,
    channel_height: usize,
    contrast_stretch: bool,
    rows: Vec<TrackedRow>,
    scratch: Vec<u8>,
}

impl LineTracker {
    /// Build a tracker for frames of `width x height`
    pub fn new(
        params: &SteeringParams,
        width: usize,
        height: usize,
    ) -> Result<Self, VisionError> {
        let (channel_width, channel_height) =
            ChannelExtractor::channel_dimensions(params.channel, width, height)
                .map_err(|e| VisionError::Config(e.to_string()))?;

        let mut rows = vec![percent_to_index(channel_height, params.read_row_pos_percent)];
        rows.extend(
            params
                .extra_row_percents
                .iter()
                .map(|pct| percent_to_index(channel_height, *pct)),
        );

        let mut tracker = Self::with_rows(
            RowSegmenter::new(params.threshold, params.min_width),
            params.channel,
            channel_width,
            channel_height,
            &rows,
        )?;
        tracker.contrast_stretch = params.contrast_stretch;

        info!(
            "Line tracker on {:?} plane {}x{}, read row {}",
            params.channel, channel_width, channel_height, tracker.rows[0].row
        );
        Ok(tracker)
    }

    /// Build a tracker over explicit row indices; the first one is the read row
    pub fn with_rows(
        segmenter: RowSegmenter,
        channel: Channel,
        channel_width: usize,
        channel_height: usize,
        rows: &[usize],
    ) -> Result<Self, VisionError> {
        let read_row = *rows
            .first()
            .ok_or_else(|| VisionError::Config("At least one row must be tracked".to_string()))?;

        let mut tracked: Vec<TrackedRow> = Vec::with_capacity(rows.len());
        for &row in rows {
            if row >= channel_height {
                return Err(VisionError::Config(format!(
                    "Row {} is outside a channel of height {}",
                    row, channel_height
                )));
            }
            if tracked.iter().all(|t| t.row != row) {
                tracked.push(TrackedRow::new(row));
            }
        }
        debug_assert_eq!(tracked[0].row, read_row);

        Ok(Self {
            segmenter,
            channel,
            channel_width,
            channel_height,
            contrast_stretch: false,
            rows: tracked,
            scratch: Vec::with_capacity(channel_width),
        })
    }

    /// Segment every tracked row of this frame and return the read row
    pub fn update(&mut self, planes: &Planes<'_>) -> Result<&TrackedRow, VisionError> {
        let plane = planes.get(self.channel);
        if plane.width() != self.channel_width || plane.height() != self.channel_height {
            return Err(VisionError::Format(format!(
                "Expected a {}x{} {:?} plane, got {}x{}",
                self.channel_width,
                self.channel_height,
                self.channel,
                plane.width(),
                plane.height()
            )));
        }

        for tracked in self.rows.iter_mut() {
            let samples = plane.row(tracked.row).ok_or_else(|| {
                VisionError::Format(format!("Row {} missing from plane", tracked.row))
            })?;

            if self.contrast_stretch {
                stretch_contrast(samples, &mut self.scratch);
                self.segmenter
                    .segment_into(&self.scratch, &mut tracked.current);
            } else {
                self.segmenter.segment_into(samples, &mut tracked.current);
            }
            tracked.commit();
        }

        Ok(&self.rows[0])
    }

    pub fn read_row(&self) -> &TrackedRow {
        &self.rows[0]
    }

    /// All tracked rows, read row first
    pub fn rows(&self) -> &[TrackedRow] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&TrackedRow> {
        self.rows.iter().find(|t| t.row == row)
    }

    /// Forget every held result
    pub fn reset(&mut self) {
        for tracked in &mut self.rows {
            tracked.reset();
        }
    }
}
