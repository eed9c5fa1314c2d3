//! # Vehicle client
//!
//! The vehicle client is the boundary between the harness and the host
//! simulation's vehicle. Rendering, physics integration and input device
//! polling all live on the host side of this boundary; the harness only
//! reads the projected pose and speed, and writes steering angles and
//! teleport requests.
//!
//! [`LoopbackVehicle`] is a minimal kinematic stand-in used by tests and
//! by standalone runs when no host simulation is attached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The vehicle's instantaneous pose projected onto the horizontal plane.
#[derive(Debug, Copy, Clone)]
pub struct VehPose {
    /// Position in the horizontal plane
    pub position_m: Vector2<f64>,

    /// Heading as an angle to the +ve x axis
    pub heading_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Interface to the host simulation's vehicle.
///
/// The teleport is the single synchronisation point between the session
/// controller and the host's physics: it places the vehicle, orients its
/// heading and zeroes its velocity in one call.
pub trait VehicleAdapter {
    /// The vehicle's pose this cycle
    fn pose(&self) -> VehPose;

    /// The vehicle's current speed in meters/second
    fn speed_ms(&self) -> f64;

    /// The raw steering input from the host's input device
    fn manual_input(&self) -> f64;

    /// True while the host has recording enabled
    fn recording_enabled(&self) -> bool;

    /// Apply an actuator angle to the steering axis, in degrees
    fn apply_steering(&mut self, angle_deg: f64);

    /// Place the vehicle at the given position and heading with zero
    /// velocity
    fn teleport(&mut self, position_m: Vector2<f64>, heading_rad: f64);
}

// ------------------------------------------------------------------------------------------------
// LOOPBACK STAND-IN
// ------------------------------------------------------------------------------------------------

/// Parameters for the loopback stand-in
#[derive(Deserialize, Debug, Clone)]
pub struct LoopbackParams {
    /// Distance between axles
    pub wheelbase_m: f64,

    /// Speed the stand-in accelerates towards when stepped
    pub target_speed_ms: f64,
}

/// A kinematic stand-in for the host vehicle.
///
/// Integrates a bicycle model at the session's cycle rate. Not a physics
/// simulation, just enough motion for the harness to be exercised without
/// a host attached.
pub struct LoopbackVehicle {
    pose: VehPose,
    speed_ms: f64,
    steer_angle_deg: f64,
    manual_input: f64,
    recording_enabled: bool,

    /// Distance between axles
    wheelbase_m: f64,

    /// Speed the stand-in accelerates towards when stepped
    target_speed_ms: f64,
}

impl LoopbackVehicle {
    pub fn new(wheelbase_m: f64, target_speed_ms: f64) -> Self {
        Self {
            pose: VehPose {
                position_m: Vector2::new(0.0, 0.0),
                heading_rad: 0.0,
            },
            speed_ms: 0.0,
            steer_angle_deg: 0.0,
            manual_input: 0.0,
            recording_enabled: false,
            wheelbase_m,
            target_speed_ms,
        }
    }

    pub fn from_params(params: &LoopbackParams) -> Self {
        Self::new(params.wheelbase_m, params.target_speed_ms)
    }

    /// Set the raw input the stand-in reports for manual and recording
    /// sessions.
    pub fn set_manual_input(&mut self, input: f64) {
        self.manual_input = input;
    }

    pub fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording_enabled = enabled;
    }

    /// Advance the stand-in by one cycle.
    pub fn step(&mut self, dt_s: f64) {
        // Gentle acceleration towards the target speed
        let speed_err = self.target_speed_ms - self.speed_ms;
        self.speed_ms += speed_err.clamp(-1.0 * dt_s, 1.0 * dt_s);

        let steer_rad = self.steer_angle_deg.to_radians();

        self.pose.heading_rad +=
            self.speed_ms / self.wheelbase_m * steer_rad.tan() * dt_s;

        self.pose.position_m += Vector2::new(
            self.pose.heading_rad.cos(),
            self.pose.heading_rad.sin(),
        ) * self.speed_ms
            * dt_s;
    }
}

impl VehicleAdapter for LoopbackVehicle {
    fn pose(&self) -> VehPose {
        self.pose
    }

    fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    fn manual_input(&self) -> f64 {
        self.manual_input
    }

    fn recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    fn apply_steering(&mut self, angle_deg: f64) {
        self.steer_angle_deg = angle_deg;
    }

    fn teleport(&mut self, position_m: Vector2<f64>, heading_rad: f64) {
        self.pose = VehPose {
            position_m,
            heading_rad,
        };
        self.speed_ms = 0.0;
        self.steer_angle_deg = 0.0;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
