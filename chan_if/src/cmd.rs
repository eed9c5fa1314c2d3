//! # Command artifact definitions
//!
//! An external writer drops steering commands into a shared directory as
//! plain text files named `{index}{suffix}`, where `{index}` is a
//! monotonically increasing non-negative integer. The file body is a single
//! text-formatted floating point value with an invariant decimal point.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use regex::Regex;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Matches command artifact names for a fixed suffix and extracts their
/// indices.
pub struct CmdMatcher {
    regex: Regex,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// An error that occurs while parsing a command artifact.
#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("The artifact body is not a valid floating point value: {0:?}")]
    InvalidBody(String),

    #[error("The artifact suffix produces an invalid name pattern: {0}")]
    InvalidSuffix(regex::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl CmdMatcher {
    /// Create a matcher for artifact names ending in the given suffix.
    pub fn new(suffix: &str) -> Result<Self, CmdParseError> {
        let regex = Regex::new(&format!(r"^(\d+){}$", regex::escape(suffix)))
            .map_err(CmdParseError::InvalidSuffix)?;

        Ok(Self { regex })
    }

    /// Get the index of an artifact name, or `None` if the name doesn't
    /// match the `{index}{suffix}` pattern.
    ///
    /// Indices too large for a `u64` do not match.
    pub fn index_of(&self, name: &str) -> Option<u64> {
        self.regex
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse the body of a command artifact into a raw command value.
///
/// Non-finite values are rejected here so they can never reach the signal
/// conditioner, whose stages propagate them silently.
pub fn parse_cmd_body(body: &str) -> Result<f64, CmdParseError> {
    let value = body
        .trim()
        .parse::<f64>()
        .map_err(|_| CmdParseError::InvalidBody(body.to_string()))?;

    if !value.is_finite() {
        return Err(CmdParseError::InvalidBody(body.to_string()));
    }

    Ok(value)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_matcher() {
        let matcher = CmdMatcher::new("sim.txt").unwrap();

        assert_eq!(matcher.index_of("3sim.txt"), Some(3));
        assert_eq!(matcher.index_of("10sim.txt"), Some(10));
        assert_eq!(matcher.index_of("sim.txt"), None);
        assert_eq!(matcher.index_of("10sim.txt.bak"), None);
        assert_eq!(matcher.index_of("x10sim.txt"), None);
        assert_eq!(matcher.index_of("10other.txt"), None);
    }

    #[test]
    fn test_parse_cmd_body() {
        assert_eq!(parse_cmd_body("0.25").unwrap(), 0.25);
        assert_eq!(parse_cmd_body(" -1.5 \n").unwrap(), -1.5);
        assert!(parse_cmd_body("not a number").is_err());
        assert!(parse_cmd_body("").is_err());
        assert!(parse_cmd_body("NaN").is_err());
        assert!(parse_cmd_body("inf").is_err());
    }
}
