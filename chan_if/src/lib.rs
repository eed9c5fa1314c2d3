//! # Channel interface crate.
//!
//! Provides the file-artifact protocol definitions shared between the
//! harness and any external driving agent. The formats here are pure, all
//! filesystem access lives in the `drive_exec` channel clients.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command artifact naming and body parsing
pub mod cmd;

/// Discrete agent actions for the learning channel
pub mod agent;

/// Telemetry records exchanged with a trainer process
pub mod telemetry;

/// Variance test results formatting
pub mod results;
