// Configuration for the line-following pipeline

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Side taken at a fork, and the segment followed when several are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkSide {
    Left,
    Right,
}

impl ForkSide {
    /// Steering sign for this side: left is negative, right is positive
    pub fn sign(self) -> f64 {
        match self {
            ForkSide::Left => -1.0,
            ForkSide::Right => 1.0,
        }
    }
}

impl Default for ForkSide {
    fn default() -> Self {
        ForkSide::Left
    }
}

/// Plane of a 4:2:0 frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Y, // Luma, full resolution
    U, // Chroma, half width and half height
    V, // Chroma, half width and half height
}

impl Default for Channel {
    fn default() -> Self {
        Channel::U
    }
}

/// Wall-closeness sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityParams {
    /// Luma column, as a percentage of frame width
    pub column_percent: f64,
    /// Samples at or below this value count as dark
    pub threshold: u8,
}

impl Default for ProximityParams {
    fn default() -> Self {
        Self {
            column_percent: 50.0,
            threshold: 125,
        }
    }
}

/// Steering configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Samples at or below this value belong to the line
    pub threshold: u8,
    /// Runs must be strictly wider than this to become segments
    pub min_width: usize,
    pub p_gain: f64,
    pub d_gain: f64,
    /// Output bound, applied symmetrically
    pub max_turn_correction: f64,
    /// Read row, as a percentage of the tracked channel's height
    pub read_row_pos_percent: f64,
    /// Minimum spacing between fork events, in seconds
    pub fork_timeout: f64,
    /// How long a multi-segment read row must persist before a fork fires, in seconds
    pub fork_time_threshold: f64,
    /// Magnitude of the steering command on a fork tick
    pub turn_at_fork: f64,
    pub preferred_fork_side: ForkSide,
    /// Plane segmented by the tracker
    pub channel: Channel,
    /// Stretch each scanned row to the full 0..=255 range before thresholding
    pub contrast_stretch: bool,
    /// Additional rows to track besides the read row
    pub extra_row_percents: Vec<f64>,
    pub proximity: ProximityParams,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            threshold: 110,
            min_width: 2,
            p_gain: 0.25,
            d_gain: 0.1,
            max_turn_correction: 0.25,
            read_row_pos_percent: 75.0,
            fork_timeout: 0.5,
            fork_time_threshold: 0.025,
            turn_at_fork: 0.25,
            preferred_fork_side: ForkSide::Left,
            channel: Channel::U,
            contrast_stretch: false,
            extra_row_percents: Vec::new(),
            proximity: ProximityParams::default(),
        }
    }
}

impl SteeringParams {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        positive("p_gain", self.p_gain)?;
        positive("d_gain", self.d_gain)?;
        positive("max_turn_correction", self.max_turn_correction)?;

        percent("read_row_pos_percent", self.read_row_pos_percent)?;
        for (i, pct) in self.extra_row_percents.iter().enumerate() {
            percent(&format!("extra_row_percents[{}]", i), *pct)?;
        }
        percent("proximity.column_percent", self.proximity.column_percent)?;

        if !self.fork_time_threshold.is_finite() || self.fork_time_threshold < 0.0 {
            return Err(Error::Configuration(format!(
                "fork_time_threshold must be a non-negative number of seconds, got {}",
                self.fork_time_threshold
            )));
        }
        if !self.fork_timeout.is_finite() {
            return Err(Error::Configuration(format!(
                "fork_timeout must be finite, got {}",
                self.fork_timeout
            )));
        }
        if self.fork_time_threshold >= self.fork_timeout {
            return Err(Error::Configuration(format!(
                "fork_time_threshold ({}) must be less than fork_timeout ({})",
                self.fork_time_threshold, self.fork_timeout
            )));
        }
        Duration::try_from_secs_f64(self.fork_timeout).map_err(|e| {
            Error::Configuration(format!(
                "fork_timeout of {} seconds is not a valid duration: {}",
                self.fork_timeout, e
            ))
        })?;

        positive("turn_at_fork", self.turn_at_fork)?;
        if self.turn_at_fork > self.max_turn_correction {
            return Err(Error::Configuration(format!(
                "turn_at_fork ({}) exceeds max_turn_correction ({})",
                self.turn_at_fork, self.max_turn_correction
            )));
        }

        Ok(())
    }

    pub fn fork_timeout_duration(&self) -> Duration {
        seconds(self.fork_timeout)
    }

    pub fn fork_time_threshold_duration(&self) -> Duration {
        seconds(self.fork_time_threshold)
    }

    /// Load and validate configuration from a JSON, TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }
}

impl FromStr for SteeringParams {
    type Err = Error;

    /// Tries JSON, then TOML, then YAML; the result is validated
    fn from_str(content: &str) -> Result<Self> {
        let params = if let Ok(params) = serde_json::from_str::<SteeringParams>(content) {
            params
        } else if let Ok(params) = toml::from_str::<SteeringParams>(content) {
            params
        } else {
            serde_yaml::from_str::<SteeringParams>(content).map_err(|e| {
                Error::Configuration(format!("Unrecognised configuration: {}", e))
            })?
        };

        params.validate()?;
        Ok(params)
    }
}

/// Map a percentage onto an index into `len` items, clamped to the last item
pub fn percent_to_index(len: usize, percent: f64) -> usize {
    let index = (len as f64 * percent / 100.0).round();
    if index.is_nan() || index <= 0.0 {
        return 0;
    }
    (index as usize).min(len.saturating_sub(1))
}

/// Seconds as a `Duration`; negative or NaN is zero, beyond range saturates
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn percent(name: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{} must be within [0, 100], got {}",
            name, value
        )))
    }
}
