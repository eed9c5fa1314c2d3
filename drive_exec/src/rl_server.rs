//! # Learning channel server
//!
//! The learning server implements the request/response handshake with a
//! trainer process. The trainer writes a small action artifact containing a
//! discrete action code; the server reads it, and publishes a telemetry
//! artifact `[angle,reward,done]` for the trainer to consume. The
//! telemetry artifact's presence on disk is the busy flag: the server only
//! writes fresh telemetry while the artifact is absent, so the trainer can
//! never observe a partially produced or skipped transition. This is an
//! at-most-one-outstanding cooperative handshake.
//!
//! Relying on file existence as a synchronisation primitive is best-effort
//! rather than a proven mutual exclusion mechanism, it is preserved for
//! compatibility with the external trainers that already speak it.
//!
//! The server also owns the evolutionary reset flag: a file whose mere
//! existence requests an immediate reset to the path start. The flag is
//! deleted as it is acted on, edge-triggered and consumed exactly once.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::path::PathBuf;

// Internal
use chan_if::agent::{self, ActionParseError, AgentAction};
use chan_if::telemetry::RlTelemetry;
use util::params;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Learning channel server state.
pub struct RlServer {
    params: Params,

    /// Time at which the speed first dropped below the low speed threshold,
    /// `None` while the vehicle is moving
    low_speed_since_s: Option<f64>,
}

/// Parameters for the learning channel server.
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Path of the action artifact written by the trainer
    pub action_file: PathBuf,

    /// Path of the telemetry artifact consumed by the trainer
    pub telemetry_file: PathBuf,

    /// Path of the evolutionary reset flag artifact
    pub reset_flag_file: PathBuf,

    /// Which episode termination policy to apply
    pub termination: TerminationPolicy,

    /// Time after an episode start during which the low speed check is not
    /// applied, in seconds
    pub grace_period_s: f64,

    /// Speed below which the vehicle counts as stalled, in meters/second
    pub low_speed_threshold_ms: f64,

    /// How long the vehicle must stay below the low speed threshold before
    /// the episode terminates, in seconds
    pub low_speed_duration_s: f64,

    /// Squared error above which the episode terminates under the error
    /// threshold policy
    pub error_failure_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Episode termination policies.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Terminate after a sustained low speed condition following a grace
    /// period
    LowSpeed,

    /// Terminate whenever the squared error exceeds a fixed failure
    /// threshold
    ErrorThreshold,
}

#[derive(Debug, thiserror::Error)]
pub enum RlServerError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Could not read the action artifact: {0}")]
    ActionReadError(std::io::Error),

    #[error("Could not parse the action artifact: {0}")]
    ActionParseFailure(ActionParseError),

    #[error("Could not write the telemetry artifact: {0}")]
    TelemetryWriteError(std::io::Error),

    #[error("Could not remove the reset flag artifact: {0}")]
    FlagRemoveError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RlServer {
    /// Create a new server from the given parameter file.
    pub fn new(params_path: &str) -> Result<Self, RlServerError> {
        let params: Params =
            params::load(params_path).map_err(RlServerError::ParamLoadError)?;

        Ok(Self::with_params(params))
    }

    /// Create a new server from already-built parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            low_speed_since_s: None,
        }
    }

    /// Read the trainer's current action.
    ///
    /// Returns `Ok(None)` if no action artifact exists yet. A malformed
    /// body is a recoverable error, the caller skips the handshake for this
    /// cycle and retries on the next.
    pub fn read_action(&self) -> Result<Option<AgentAction>, RlServerError> {
        if !self.params.action_file.exists() {
            return Ok(None);
        }

        let body = std::fs::read_to_string(&self.params.action_file)
            .map_err(RlServerError::ActionReadError)?;

        agent::parse_action_body(&body)
            .map(Some)
            .map_err(RlServerError::ActionParseFailure)
    }

    /// True if the previous telemetry artifact has not been consumed yet.
    pub fn telemetry_pending(&self) -> bool {
        self.params.telemetry_file.exists()
    }

    /// Publish a telemetry record for the trainer.
    ///
    /// Returns `Ok(true)` if the record was written, or `Ok(false)` if the
    /// previous record is still unconsumed, in which case nothing is
    /// written. The absence check is what keeps the handshake
    /// at-most-one-outstanding.
    pub fn write_telemetry(&self, telemetry: &RlTelemetry) -> Result<bool, RlServerError> {
        if self.telemetry_pending() {
            return Ok(false);
        }

        std::fs::write(
            &self.params.telemetry_file,
            telemetry.to_artifact_string(),
        )
        .map_err(RlServerError::TelemetryWriteError)?;

        Ok(true)
    }

    /// Evaluate the episode termination policy for this cycle.
    pub fn check_done(
        &mut self,
        sq_err: f64,
        speed_ms: f64,
        time_s: f64,
        episode_start_s: f64,
    ) -> bool {
        match self.params.termination {
            TerminationPolicy::ErrorThreshold => {
                sq_err > self.params.error_failure_threshold
            }
            TerminationPolicy::LowSpeed => {
                // No check during the grace period after an episode start
                if time_s - episode_start_s < self.params.grace_period_s {
                    self.low_speed_since_s = None;
                    return false;
                }

                if speed_ms < self.params.low_speed_threshold_ms {
                    match self.low_speed_since_s {
                        Some(since_s) => {
                            time_s - since_s >= self.params.low_speed_duration_s
                        }
                        None => {
                            self.low_speed_since_s = Some(time_s);
                            false
                        }
                    }
                }
                else {
                    self.low_speed_since_s = None;
                    false
                }
            }
        }
    }

    /// Clear the per-episode termination tracking, called on episode reset.
    pub fn reset_episode(&mut self) {
        self.low_speed_since_s = None;
    }

    /// Consume the evolutionary reset flag if it is present.
    ///
    /// Returns `Ok(true)` exactly once per flag, the artifact is deleted
    /// before this returns.
    pub fn take_reset_flag(&self) -> Result<bool, RlServerError> {
        if !self.params.reset_flag_file.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&self.params.reset_flag_file)
            .map_err(RlServerError::FlagRemoveError)?;

        Ok(true)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
