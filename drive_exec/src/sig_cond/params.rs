//! Signal conditioner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the signal conditioner
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {
    /// Enables the backlash (dead-band) stage
    pub backlash_enabled: bool,

    /// Full width of the dead-band, in raw command units
    pub backlash_width: f64,

    /// Enables the drift stage. Requires the backlash stage.
    pub drift_enabled: bool,

    /// Rate at which the output wanders towards the band edge opposing the
    /// input sign, in raw command units per second
    pub drift_rate: f64,

    /// Enables the low pass stage
    pub low_pass_enabled: bool,

    /// Low pass weights, most recent sample first. The length of this
    /// vector sets the length of the sample history.
    pub low_pass_weights: Vec<f64>,

    /// If true the conditioned value is remapped through
    /// `atan(value * steer_gain)` to a wheel angle, otherwise it is used as
    /// the actuator angle directly
    pub arctan_remap: bool,

    /// Calibration constant between normalised steering input and physical
    /// wheel geometry, used by the arctangent remap
    pub steer_gain: f64,
}
