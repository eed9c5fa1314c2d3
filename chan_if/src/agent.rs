//! # Agent action definitions
//!
//! A trainer process commands the vehicle through a single action artifact
//! containing a discrete action code. Codes map onto [`AgentAction`]:
//! `0` is no-op, `1` steers negative, `2` steers positive.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A discrete steering action commanded by a learning agent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Leave the steering command at neutral.
    NoOp,

    /// Steer towards the negative command direction.
    SteerNegative,

    /// Steer towards the positive command direction.
    SteerPositive,
}

/// An error that occurs while parsing an action artifact.
#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("The artifact body is not a valid integer: {0:?}")]
    InvalidBody(String),

    #[error("Unknown action code: {0}")]
    UnknownCode(i64),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl AgentAction {
    /// The sign this action applies to the raw steering command.
    pub fn steer_sign(&self) -> f64 {
        match self {
            AgentAction::NoOp => 0f64,
            AgentAction::SteerNegative => -1f64,
            AgentAction::SteerPositive => 1f64,
        }
    }
}

impl TryFrom<i64> for AgentAction {
    type Error = ActionParseError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AgentAction::NoOp),
            1 => Ok(AgentAction::SteerNegative),
            2 => Ok(AgentAction::SteerPositive),
            c => Err(ActionParseError::UnknownCode(c)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse the body of an action artifact.
///
/// The body is a single integer optionally surrounded by whitespace.
pub fn parse_action_body(body: &str) -> Result<AgentAction, ActionParseError> {
    let code = body
        .trim()
        .parse::<i64>()
        .map_err(|_| ActionParseError::InvalidBody(body.to_string()))?;

    AgentAction::try_from(code)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_action_body() {
        assert_eq!(parse_action_body("0").unwrap(), AgentAction::NoOp);
        assert_eq!(parse_action_body(" 1 ").unwrap(), AgentAction::SteerNegative);
        assert_eq!(parse_action_body("2\n").unwrap(), AgentAction::SteerPositive);
        assert!(matches!(
            parse_action_body("3"),
            Err(ActionParseError::UnknownCode(3))
        ));
        assert!(matches!(
            parse_action_body("two"),
            Err(ActionParseError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_steer_sign() {
        assert_eq!(AgentAction::NoOp.steer_sign(), 0f64);
        assert_eq!(AgentAction::SteerNegative.steer_sign(), -1f64);
        assert_eq!(AgentAction::SteerPositive.steer_sign(), 1f64);
    }
}
