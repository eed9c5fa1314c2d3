//! # Learning telemetry definitions
//!
//! After each handled action the harness publishes a telemetry artifact
//! for the trainer: a 3-element array literal `[angle,reward,done]` with a
//! lowercase boolean. The artifact's presence on disk is the channel-busy
//! flag, the trainer deletes it once the transition has been consumed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// One transition's telemetry, written for the trainer to consume.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlTelemetry {
    /// The actuator angle applied this tick, in degrees.
    pub actuator_angle_deg: f64,

    /// The reward for this transition.
    pub reward: f64,

    /// True if the episode has terminated.
    pub done: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// An error that occurs while parsing a telemetry artifact.
#[derive(Debug, Error)]
pub enum TelemetryParseError {
    #[error("The artifact body is not a 3-element array literal: {0:?}")]
    InvalidBody(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl RlTelemetry {
    /// Format this record as the artifact body.
    pub fn to_artifact_string(&self) -> String {
        format!(
            "[{},{},{}]",
            self.actuator_angle_deg, self.reward, self.done
        )
    }

    /// Parse an artifact body back into a record.
    pub fn from_artifact_str(body: &str) -> Result<Self, TelemetryParseError> {
        let invalid = || TelemetryParseError::InvalidBody(body.to_string());

        let inner = body
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(invalid)?;

        let mut elements = inner.split(',');

        let actuator_angle_deg = elements
            .next()
            .and_then(|e| e.trim().parse::<f64>().ok())
            .ok_or_else(invalid)?;
        let reward = elements
            .next()
            .and_then(|e| e.trim().parse::<f64>().ok())
            .ok_or_else(invalid)?;
        let done = elements
            .next()
            .and_then(|e| e.trim().parse::<bool>().ok())
            .ok_or_else(invalid)?;

        if elements.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            actuator_angle_deg,
            reward,
            done,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_artifact_format() {
        let tm = RlTelemetry {
            actuator_angle_deg: 1.5,
            reward: 0.75,
            done: false,
        };

        assert_eq!(tm.to_artifact_string(), "[1.5,0.75,false]");
    }

    #[test]
    fn test_artifact_parse() {
        let tm = RlTelemetry::from_artifact_str("[1.5,0.75,false]").unwrap();
        assert_eq!(tm.actuator_angle_deg, 1.5);
        assert_eq!(tm.reward, 0.75);
        assert!(!tm.done);

        let tm = RlTelemetry::from_artifact_str("[-3,-0.25,true]").unwrap();
        assert_eq!(tm.actuator_angle_deg, -3.0);
        assert!(tm.done);

        assert!(RlTelemetry::from_artifact_str("1.5,0.75,false").is_err());
        assert!(RlTelemetry::from_artifact_str("[1.5,0.75]").is_err());
        assert!(RlTelemetry::from_artifact_str("[1.5,0.75,False]").is_err());
        assert!(RlTelemetry::from_artifact_str("[1,2,true,4]").is_err());
    }
}
