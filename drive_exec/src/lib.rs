//! # Drive session library.
//!
//! This library allows other crates in the workspace to access items defined
//! inside the drive session executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command channel client - polls the shared artifact directory for steering commands
pub mod cmd_client;

/// Global data store for the executable
pub mod data_store;

/// Drive manager - session mode state machine, owns lane sequencing and resets
pub mod drive_mgr;

/// Reference path handling - waypoint loading and segment geometry
pub mod path;

/// Learning channel server - action/telemetry handshake with a trainer process
pub mod rl_server;

/// Signal conditioner module - converts raw commands into actuator angles
pub mod sig_cond;

/// Cross track error estimator - squared lateral deviation from the reference path
pub mod track_err;

/// Vehicle client - interface to the host simulation's vehicle
pub mod veh_client;
