//! Implementations for the SigCond state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Backlash, Drift, LowPass, Params, SigCondError};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Signal conditioner module state
///
/// All conditioner state is explicit and owned here, one instance per
/// vehicle. There are no module-level statics, resetting the module resets
/// the full filter chain.
#[derive(Default)]
pub struct SigCond {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    pub(crate) backlash: Option<Backlash>,
    pub(crate) drift: Option<Drift>,
    pub(crate) low_pass: Option<LowPass>,
}

/// Input data to the signal conditioner.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// The raw command from the channel
    pub raw_cmd: f64,

    /// The simulation time of this cycle in seconds
    pub time_s: f64,
}

/// Output data from the signal conditioner.
#[derive(Clone, Copy, Serialize, Debug, Default)]
pub struct OutputData {
    /// The actuator angle to apply to the steering axis, in degrees
    pub actuator_angle_deg: f64,

    /// The conditioned value before the output remap
    pub conditioned: f64,
}

/// Status report for signal conditioner processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True if the dead-band was dragged by this input
    pub band_moved: bool,

    /// True if the drift stage saturated at a band edge
    pub drift_saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SigCond {
    type InitData = &'static str;
    type InitError = SigCondError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SigCondError;

    /// Initialise the SigCond module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(SigCondError::ParamLoadError(e))
        };

        // The drift stage clamps against the dead-band edges so it cannot
        // run without the backlash stage
        if self.params.drift_enabled && !self.params.backlash_enabled {
            return Err(SigCondError::DriftWithoutBacklash);
        }

        if self.params.low_pass_enabled && self.params.low_pass_weights.is_empty() {
            return Err(SigCondError::EmptyLowPassWeights);
        }

        // Build the enabled stages
        if self.params.backlash_enabled {
            self.backlash = Some(Backlash::new(self.params.backlash_width));
        }
        if self.params.drift_enabled {
            self.drift = Some(Drift::new(self.params.drift_rate));
        }
        if self.params.low_pass_enabled {
            self.low_pass = Some(LowPass::new(self.params.low_pass_weights.clone()));
        }

        Ok(())
    }

    /// Perform cyclic processing of the signal conditioner.
    ///
    /// All stages are pure numeric transforms, non-finite inputs propagate
    /// and are guarded by the channel clients, not here.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        let raw = input_data.raw_cmd;
        let mut conditioned = raw;

        if let Some(ref mut backlash) = self.backlash {
            let edges_before = backlash.edges();
            conditioned = backlash.apply(raw);
            self.report.band_moved = backlash.edges() != edges_before;

            if let Some(ref mut drift) = self.drift {
                let edges = backlash.edges();
                conditioned = drift.apply(raw, conditioned, edges, input_data.time_s);
                self.report.drift_saturated =
                    conditioned == edges.0 || conditioned == edges.1;
            }
        }

        // The ring always holds raw samples, when enabled the filter output
        // becomes the conditioned value
        if let Some(ref mut low_pass) = self.low_pass {
            conditioned = low_pass.apply(raw);
        }

        let actuator_angle_deg = match self.params.arctan_remap {
            true => (conditioned * self.params.steer_gain).atan().to_degrees(),
            false => conditioned,
        };

        trace!(
            "SigCond output:\n    conditioned: {:.6}\n    angle: {:.6} deg",
            conditioned,
            actuator_angle_deg
        );

        let output = OutputData {
            actuator_angle_deg,
            conditioned,
        };

        Ok((output, self.report))
    }
}

impl SigCond {
    /// Reset the full filter chain.
    ///
    /// Called on episode resets so one episode's linkage state cannot leak
    /// into the next.
    pub fn reset(&mut self) {
        if let Some(ref mut backlash) = self.backlash {
            backlash.reset();
        }
        if let Some(ref mut drift) = self.drift {
            drift.reset();
        }
        if let Some(ref mut low_pass) = self.low_pass {
            low_pass.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn conditioner_with(params: Params) -> SigCond {
        // Build the module directly, tests don't go through parameter files
        let mut cond = SigCond::default();

        if params.backlash_enabled {
            cond.backlash = Some(Backlash::new(params.backlash_width));
        }
        if params.drift_enabled {
            cond.drift = Some(Drift::new(params.drift_rate));
        }
        if params.low_pass_enabled {
            cond.low_pass = Some(LowPass::new(params.low_pass_weights.clone()));
        }

        cond.params = params;
        cond
    }

    #[test]
    fn test_passthrough_when_all_disabled() {
        let mut cond = conditioner_with(Params::default());

        let (out, _) = cond
            .proc(&InputData {
                raw_cmd: 0.3,
                time_s: 0.0,
            })
            .unwrap();

        assert_eq!(out.actuator_angle_deg, 0.3);
        assert_eq!(out.conditioned, 0.3);
    }

    #[test]
    fn test_arctan_remap() {
        let mut cond = conditioner_with(Params {
            arctan_remap: true,
            steer_gain: 2.0,
            ..Default::default()
        });

        let (out, _) = cond
            .proc(&InputData {
                raw_cmd: 0.5,
                time_s: 0.0,
            })
            .unwrap();

        let expected = (0.5f64 * 2.0).atan().to_degrees();
        assert!((out.actuator_angle_deg - expected).abs() < 1e-12);
        assert_eq!(out.conditioned, 0.5);
    }

    #[test]
    fn test_backlash_report() {
        let mut cond = conditioner_with(Params {
            backlash_enabled: true,
            backlash_width: 0.2,
            ..Default::default()
        });

        let (out, report) = cond
            .proc(&InputData {
                raw_cmd: 0.5,
                time_s: 0.0,
            })
            .unwrap();
        assert!((out.conditioned - 0.4).abs() < 1e-12);
        assert!(report.band_moved);

        // Inside the band the output holds and the band stays put
        let (out, report) = cond
            .proc(&InputData {
                raw_cmd: 0.45,
                time_s: 0.02,
            })
            .unwrap();
        assert!((out.conditioned - 0.4).abs() < 1e-12);
        assert!(!report.band_moved);
    }

    #[test]
    fn test_low_pass_reads_raw_history() {
        // Backlash and low pass both enabled, the filter output must be the
        // weighted average of the raw inputs, not of the band centres
        let mut cond = conditioner_with(Params {
            backlash_enabled: true,
            backlash_width: 0.2,
            low_pass_enabled: true,
            low_pass_weights: vec![1.0, 1.0],
            ..Default::default()
        });

        cond.proc(&InputData {
            raw_cmd: 0.5,
            time_s: 0.0,
        })
        .unwrap();
        let (out, _) = cond
            .proc(&InputData {
                raw_cmd: 0.7,
                time_s: 0.02,
            })
            .unwrap();

        assert!((out.conditioned - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_chain() {
        let mut cond = conditioner_with(Params {
            backlash_enabled: true,
            backlash_width: 0.2,
            ..Default::default()
        });

        cond.proc(&InputData {
            raw_cmd: 0.5,
            time_s: 0.0,
        })
        .unwrap();
        cond.reset();

        let (out, _) = cond
            .proc(&InputData {
                raw_cmd: 0.05,
                time_s: 0.02,
            })
            .unwrap();

        // Band re-centred on zero, a small input stays inside it
        assert_eq!(out.conditioned, 0.0);
    }
}
