//! Synthetic camera input for exercising the line pipeline

pub mod scene;

pub use scene::SyntheticTrack;
