use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Frame buffer does not match its declared geometry
    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
