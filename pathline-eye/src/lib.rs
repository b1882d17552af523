//! pathline-eye: scan-line vision for a line-following vehicle
//!
//! Splits raw 4:2:0 planar frames into planes, segments scan rows into dark
//! line features, estimates wall closeness from a luma column and tracks the
//! read row across frames with a hold-last-good policy.

pub mod error;
pub mod frame;
pub mod processing;

pub use error::VisionError;
pub use frame::{ChannelExtractor, Frame, Plane, Planes};
pub use processing::{
    ColumnProximityEstimator, LineFix, LineSegment, LineTracker, RowResult, RowSegmenter,
    TrackedRow,
};
