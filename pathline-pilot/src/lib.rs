//! pathline-pilot: turns tracked line segments into a bounded steering command
//!
//! One `LinePipeline::process` call per camera frame runs the vision stages,
//! debounces forks and applies the PD steering law.

pub mod error;
pub mod fork;
pub mod mixer;
pub mod pipeline;
pub mod steering;
pub mod timing;

pub use error::PilotError;
pub use fork::{ForkDetector, ForkPhase};
pub use mixer::{MotorMixer, MotorPower};
pub use pipeline::{LinePipeline, SharedPipeline, TickOutput};
pub use steering::{SteeringCommand, SteeringController};
pub use timing::{FrameStats, FrameTiming};
