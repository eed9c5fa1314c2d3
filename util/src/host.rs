//! Host environment utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the software root.
pub const ROOT_ENV_VAR: &str = "STEER_SIM_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the `STEER_SIM_ROOT` environment
/// variable.
///
/// Parameter files and session directories are resolved relative to this
/// root so that the same install works from any working directory.
pub fn get_steer_sim_root() -> Result<PathBuf, env::VarError> {
    Ok(PathBuf::from(env::var(ROOT_ENV_VAR)?))
}
