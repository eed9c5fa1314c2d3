//! Backlash and drift stage calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The backlash (dead-band) stage.
///
/// Models steering linkage slack as a band of fixed width around a mobile
/// centre. Inputs inside the band leave the centre where it is, inputs
/// outside drag the band along so that the input sits exactly on the near
/// edge. The stage output is always the centre.
#[derive(Debug, Clone)]
pub struct Backlash {
    /// Current dead-band centre
    centre: f64,

    /// Half the configured band width
    half_width: f64,
}

/// The drift stage.
///
/// Models the tendency of the vehicle to wander towards the road edge
/// nearest the current steering sign, the crown-of-the-road effect. While
/// the raw input sign is stable the stage pushes the band output towards
/// the band edge opposing the sign, growing with the time since the last
/// sign change.
#[derive(Debug, Clone)]
pub struct Drift {
    /// Drift rate in raw command units per second
    rate: f64,

    /// Sign of the last observed raw input
    last_sign: f64,

    /// Time of the last observed sign change
    last_change_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Backlash {
    /// Create a new stage with the given full band width, centred on zero.
    pub fn new(width: f64) -> Self {
        Self {
            centre: 0f64,
            half_width: 0.5 * width,
        }
    }

    /// Apply the stage to a raw input, returning the band centre.
    pub fn apply(&mut self, raw: f64) -> f64 {
        if (raw - self.centre).abs() > self.half_width {
            // Drag the band so the input lands exactly on the near edge
            if raw > self.centre {
                self.centre = raw - self.half_width;
            }
            else {
                self.centre = raw + self.half_width;
            }
        }

        self.centre
    }

    /// The current band edges as (lower, upper).
    pub fn edges(&self) -> (f64, f64) {
        (self.centre - self.half_width, self.centre + self.half_width)
    }

    /// Re-centre the band on zero.
    pub fn reset(&mut self) {
        self.centre = 0f64;
    }
}

impl Drift {
    /// Create a new stage with the given drift rate.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            last_sign: 0f64,
            last_change_s: None,
        }
    }

    /// Apply the stage to the band output.
    ///
    /// The sign is taken from the raw input, not the band output, so that
    /// small commands inside the dead-band still hold the drift direction.
    /// `f64::signum` is used, positive zero counts as a positive sign.
    pub fn apply(&mut self, raw: f64, band_out: f64, edges: (f64, f64), time_s: f64) -> f64 {
        let sign = raw.signum();

        // On a sign flip reset the timer and pass the band output through
        if self.last_change_s.is_none() || sign != self.last_sign {
            self.last_sign = sign;
            self.last_change_s = Some(time_s);
            return band_out;
        }

        let dt_s = time_s - self.last_change_s.unwrap_or(time_s);

        let drifted = band_out + dt_s * self.rate * -sign;

        clamp(&drifted, &edges.0, &edges.1)
    }

    /// Clear the sign tracking state.
    pub fn reset(&mut self) {
        self.last_sign = 0f64;
        self.last_change_s = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
