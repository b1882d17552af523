//! Scan-row segmentation into dark line segments

use pathline_core::ForkSide;
use serde::{Deserialize, Serialize};

/// Dark run on one scan row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start_col: usize,
    /// Exclusive
    pub end_col: usize,
    pub width_px: usize,
    pub center_px: f64,
    /// Midpoint normalized to [-1, 1], left edge is -1
    pub position: f64,
}

impl LineSegment {
    /// Segment spanning `start_col..end_col` on a row of `row_width` samples
    pub fn from_bounds(start_col: usize, end_col: usize, row_width: usize) -> Self {
        debug_assert!(start_col <= end_col && end_col <= row_width);
        let span = (start_col + end_col) as f64;
        let position = if row_width == 0 {
            0.0
        } else {
            span / row_width as f64 - 1.0
        };
        Self {
            start_col,
            end_col,
            width_px: end_col - start_col,
            center_px: span / 2.0,
            position,
        }
    }
}

/// Segments found on one row, ordered left to right
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    segments: Vec<LineSegment>,
}

impl RowResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn leftmost(&self) -> Option<&LineSegment> {
        self.segments.first()
    }

    pub fn rightmost(&self) -> Option<&LineSegment> {
        self.segments.last()
    }

    /// Segment to follow when the row holds more than one
    pub fn select(&self, side: ForkSide) -> Option<&LineSegment> {
        match side {
            ForkSide::Left => self.leftmost(),
            ForkSide::Right => self.rightmost(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineSegment> {
        self.segments.iter()
    }

    /// Overwrite with `other`, keeping this result's allocation
    pub fn copy_from(&mut self, other: &RowResult) {
        self.segments.clear();
        self.segments.extend_from_slice(&other.segments);
    }

    fn clear(&mut self) {
        self.segments.clear();
    }
}

impl From<Vec<LineSegment>> for RowResult {
    fn from(mut segments: Vec<LineSegment>) -> Self {
        segments.sort_by_key(|s| s.start_col);
        Self { segments }
    }
}

impl<'a> IntoIterator for &'a RowResult {
    type Item = &'a LineSegment;
    type IntoIter = std::slice::Iter<'a, LineSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Single-pass run-length segmenter
///
/// A sample at or below `threshold` opens or extends a run, anything brighter
/// closes it. Runs must be strictly wider than `min_width`; a run still open at
/// the end of the row is closed at the row boundary, so a row that is dark
/// end to end yields one full-width segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSegmenter {
    threshold: u8,
    min_width: usize,
}

impl RowSegmenter {
    pub fn new(threshold: u8, min_width: usize) -> Self {
        Self {
            threshold,
            min_width,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn min_width(&self) -> usize {
        self.min_width
    }

    pub fn segment(&self, row: &[u8]) -> RowResult {
        let mut result = RowResult::new();
        self.segment_into(row, &mut result);
        result
    }

    /// Segment `row` into `out`, replacing its contents
    pub fn segment_into(&self, row: &[u8], out: &mut RowResult) {
        out.clear();
        let width = row.len();
        let mut inside = false;
        let mut start = 0;

        for (col, &sample) in row.iter().enumerate() {
            if sample <= self.threshold {
                if !inside {
                    inside = true;
                    start = col;
                }
            } else if inside {
                inside = false;
                self.close_run(start, col, width, out);
            }
        }

        if inside {
            self.close_run(start, width, width, out);
        }
    }

    fn close_run(&self, start: usize, end: usize, width: usize, out: &mut RowResult) {
        if end - start > self.min_width {
            out.segments.push(LineSegment::from_bounds(start, end, width));
        }
    }
}

/// Stretch `row` so its darkest sample maps to 0 and its brightest to 255
///
/// Flat rows are copied unchanged.
pub fn stretch_contrast(row: &[u8], out: &mut Vec<u8>) {
    out.clear();
    let (min, max) = row
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    if row.is_empty() || min == max {
        out.extend_from_slice(row);
        return;
    }

    let range = u32::from(max - min);
    out.extend(
        row.iter()
            .map(|&s| (u32::from(s - min) * 255 / range) as u8),
    );
}
