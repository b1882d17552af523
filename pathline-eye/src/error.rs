//! Error types for pathline-eye

use pathline_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Format(msg) => CoreError::Format(msg),
            VisionError::Config(msg) => CoreError::Configuration(msg),
            VisionError::Core(core) => core,
        }
    }
}
