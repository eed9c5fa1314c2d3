//! Drive manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drive manager
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Waypoint files defining the session's lanes, relative to the `lanes`
    /// directory under the software root. The first entry is the lane used
    /// by the learning and evolutionary modes.
    pub lane_files: Vec<String>,

    /// Time the variance test spends on each lane before switching, in
    /// seconds
    pub time_spent_on_lane_s: f64,

    /// If true, episode resets in reinforcement mode start from a random
    /// point along the lane rather than from point 0, diversifying the
    /// trainer's episodes
    pub randomize_episode_start: bool,

    /// Magnitude of the raw steering command a discrete agent action maps
    /// onto
    pub rl_steer_magnitude: f64,

    /// Directory the variance test writes results artifacts into
    pub results_dir: PathBuf,
}
