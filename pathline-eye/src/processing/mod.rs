//! Scan-line processing stages

pub mod proximity;
pub mod segmentation;
pub mod tracker;

pub use proximity::ColumnProximityEstimator;
pub use segmentation::{stretch_contrast, LineSegment, RowResult, RowSegmenter};
pub use tracker::{LineFix, LineTracker, TrackedRow};
