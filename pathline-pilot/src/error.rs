//! Error types for pathline-pilot

use pathline_core::Error as CoreError;
use pathline_eye::VisionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl PilotError {
    /// Frame did not match its declared geometry; no output for that frame
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            PilotError::Vision(VisionError::Format(_))
                | PilotError::Vision(VisionError::Core(CoreError::Format(_)))
                | PilotError::Core(CoreError::Format(_))
        )
    }

    /// Rejected at construction
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PilotError::Config(_)
                | PilotError::Vision(VisionError::Config(_))
                | PilotError::Vision(VisionError::Core(CoreError::Configuration(_)))
                | PilotError::Core(CoreError::Configuration(_))
        )
    }
}

impl From<PilotError> for CoreError {
    fn from(err: PilotError) -> Self {
        match err {
            PilotError::Vision(vision) => vision.into(),
            PilotError::Config(msg) => CoreError::Configuration(msg),
            PilotError::Core(core) => core,
        }
    }
}
