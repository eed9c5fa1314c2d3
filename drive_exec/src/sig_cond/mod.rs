//! # Signal conditioner module
//!
//! The signal conditioner maps a raw steering command from the channel into
//! a physical actuator angle. It models the mechanical imperfections of a
//! real steering linkage with up to three stages applied in order:
//!
//! - A backlash (dead-band) stage simulating linkage slack, the output
//!   sticks until the input drags the band far enough.
//! - A drift stage simulating the tendency to wander towards the road edge
//!   nearest the current input sign while the sign is stable.
//! - A low-pass stage, a weighted moving average over the most recent raw
//!   commands.
//!
//! Each stage is enabled independently by parameters and some session modes
//! run with all of them disabled. The conditioned value is optionally
//! remapped through an arctangent calibration onto wheel geometry.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod backlash;
mod low_pass;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use backlash::*;
pub use low_pass::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SigCond operation.
#[derive(Debug, thiserror::Error)]
pub enum SigCondError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("The drift stage requires the backlash stage to be enabled")]
    DriftWithoutBacklash,

    #[error("The low pass stage requires a non-empty weight vector")]
    EmptyLowPassWeights,
}
