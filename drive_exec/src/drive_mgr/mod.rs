//! # DriveMgr module
//!
//! This module implements the [`DriveMgr`] state machine, which sequences a
//! drive session over one of the session modes:
//!
//! - `Manual` - The host's input device drives the vehicle directly, the
//!   harness takes no actions.
//! - `Recording` - Raw input and vehicle state are archived each frame once
//!   the host enables recording.
//! - `Autonomous` - Steering commands are polled from the command channel
//!   and conditioned into actuator angles.
//! - `AutonomousVarianceTest` - Autonomous driving over a sequence of
//!   lanes, accumulating cross track errors and flushing a results artifact
//!   per lane.
//! - `AutonomousReinforcement` - A trainer drives the vehicle through the
//!   learning handshake, receiving reward telemetry each step.
//! - `AutonomousEvolutionary` - Autonomous driving with an external reset
//!   flag that teleports the vehicle back to the lane start.
//!
//! The manager owns lane sequencing, reset-to-start, and the accumulation
//! of cross track errors, and drives the channel clients and the signal
//! conditioner once per cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;

use crate::cmd_client::CmdClientError;
use crate::path::PathError;
use crate::rl_server::RlServerError;
use crate::sig_cond::SigCondError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during DriveMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveMgrError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("The software root environment variable (STEER_SIM_ROOT) is not set")]
    SwRootNotSet,

    #[error("The session mode requires lanes but none are configured")]
    NoLanes,

    #[error("Could not load lane {0}: {1}")]
    LaneLoadError(String, PathError),

    #[error("No lane is loaded at the current lane index")]
    NoLaneLoaded,

    #[error("Error initialising the signal conditioner: {0}")]
    SigCondError(SigCondError),

    #[error("Error initialising the command client: {0}")]
    CmdClientError(CmdClientError),

    #[error("Error initialising the learning server: {0}")]
    RlServerError(RlServerError),

    #[error("Error initialising the recording archiver: {0}")]
    ArchiverInitError(String),
}
