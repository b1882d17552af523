pub mod error;
pub mod config;

pub use error::{Error, Result};
pub use config::{
    percent_to_index, Channel, ForkSide, ProximityParams, SteeringParams,
};
