//! Differential-drive mixing of steering and throttle into motor powers

use crate::error::PilotError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorPower {
    pub left: i32,
    pub right: i32,
}

/// Maps a yaw input (the steering command) and a throttle to wheel powers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorMixer {
    /// Largest magnitude either wheel may receive
    pub max_power: f64,
    /// Flip both outputs for motors wired in reverse
    pub inverted: bool,
}

impl Default for MotorMixer {
    fn default() -> Self {
        Self {
            max_power: 100.0,
            inverted: false,
        }
    }
}

impl MotorMixer {
    pub fn new(max_power: f64) -> Result<Self, PilotError> {
        let mixer = Self {
            max_power,
            ..Self::default()
        };
        mixer.validate()?;
        Ok(mixer)
    }

    /// Reject a non-finite or non-positive `max_power`; call after deserializing
    pub fn validate(&self) -> Result<(), PilotError> {
        if self.max_power.is_finite() && self.max_power > 0.0 {
            Ok(())
        } else {
            Err(PilotError::Config(format!(
                "max_power must be positive, got {}",
                self.max_power
            )))
        }
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Yaw and throttle are nominally in [-1, 1]; the larger wheel demand is
    /// scaled down to `max_power` when their sum exceeds 1
    pub fn mix(&self, yaw: f64, throttle: f64) -> MotorPower {
        let left = throttle + yaw;
        let right = throttle - yaw;
        if !left.is_finite() || !right.is_finite() {
            return MotorPower { left: 0, right: 0 };
        }

        let scale = self.max_power / 1f64.max(left.abs()).max(right.abs());
        let sign = if self.inverted { -1.0 } else { 1.0 };

        MotorPower {
            left: (left * scale * sign) as i32,
            right: (right * scale * sign) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight() {
        let mixer = MotorMixer::default();
        assert_eq!(mixer.mix(0.0, 0.5), MotorPower { left: 50, right: 50 });
    }

    #[test]
    fn test_turn_within_range() {
        let mixer = MotorMixer::default();
        let power = mixer.mix(0.25, 0.5);
        assert_eq!(power, MotorPower { left: 75, right: 25 });
    }

    #[test]
    fn test_overdrive_is_normalized() {
        let mixer = MotorMixer::default();
        // left = 2, right = 0; scaled so left hits max_power
        assert_eq!(mixer.mix(1.0, 1.0), MotorPower { left: 100, right: 0 });
        assert_eq!(mixer.mix(-1.0, 1.0), MotorPower { left: 0, right: 100 });
    }

    #[test]
    fn test_inverted() {
        let mixer = MotorMixer::new(100.0).unwrap().inverted(true);
        assert_eq!(mixer.mix(0.25, 0.5), MotorPower { left: -75, right: -25 });
    }

    #[test]
    fn test_rejects_bad_max_power() {
        for max_power in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            let err = MotorMixer::new(max_power).err().unwrap();
            assert!(err.is_configuration());
        }
        assert_eq!(MotorMixer::new(255.0).unwrap().mix(0.0, 1.0), MotorPower { left: 255, right: 255 });
    }

    #[test]
    fn test_validate_deserialized_mixer() {
        let mixer: MotorMixer = serde_json::from_str(r#"{"max_power": -50.0}"#).unwrap();
        assert!(mixer.validate().is_err());

        let mixer: MotorMixer = serde_json::from_str(r#"{"inverted": true}"#).unwrap();
        assert!(mixer.validate().is_ok());
        assert_eq!(mixer.max_power, 100.0);
    }

    #[test]
    fn test_non_finite_input_stops() {
        let mixer = MotorMixer::default();
        assert_eq!(mixer.mix(f64::NAN, 0.5), MotorPower { left: 0, right: 0 });
    }
}
