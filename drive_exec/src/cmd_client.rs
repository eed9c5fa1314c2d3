//! # Command channel client
//!
//! The command client polls a shared artifact directory for steering
//! commands written by an external agent process. Artifacts are named
//! `{index}{suffix}` with a monotonically increasing index, each poll
//! selects the artifact with the highest index (the most recently written)
//! and parses its body as a single floating point command.
//!
//! Every failure here is recoverable. An empty directory, a directory with
//! no matching names, or an unparseable body all degrade to "no new
//! command this cycle" at the call site, the session holds the last known
//! actuator value and retries on the next cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::trace;
use serde::Deserialize;
use std::path::PathBuf;

// Internal
use chan_if::cmd::{self, CmdMatcher};
use util::params;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Command channel client state.
pub struct CmdClient {
    params: Params,

    matcher: CmdMatcher,

    /// Time of the last directory scan
    last_poll_time_s: Option<f64>,
}

/// Parameters for the command channel client.
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Directory the external agent writes command artifacts into
    pub artifact_dir: PathBuf,

    /// Fixed suffix of command artifact names
    pub artifact_suffix: String,

    /// Minimum interval between directory scans in seconds, emulating the
    /// polling cadence of the hardware that originally drove this channel
    pub poll_interval_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdClientError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Invalid artifact suffix: {0}")]
    InvalidSuffix(cmd::CmdParseError),

    #[error("No command artifact found in {0:?}")]
    ChannelEmpty(PathBuf),

    #[error("Could not read the artifact directory: {0}")]
    DirReadError(std::io::Error),

    #[error("Could not read the command artifact {0:?}: {1}")]
    ArtifactReadError(PathBuf, std::io::Error),

    #[error("Could not parse the command artifact {0:?}: {1}")]
    ParseFailure(PathBuf, cmd::CmdParseError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdClient {
    /// Create a new client from the given parameter file.
    pub fn new(params_path: &str) -> Result<Self, CmdClientError> {
        let params: Params =
            params::load(params_path).map_err(CmdClientError::ParamLoadError)?;

        Self::with_params(params)
    }

    /// Create a new client from already-built parameters.
    pub fn with_params(params: Params) -> Result<Self, CmdClientError> {
        let matcher = CmdMatcher::new(&params.artifact_suffix)
            .map_err(CmdClientError::InvalidSuffix)?;

        Ok(Self {
            params,
            matcher,
            last_poll_time_s: None,
        })
    }

    /// Poll the channel for the most recent command.
    ///
    /// Returns `Ok(None)` if the poll interval hasn't elapsed yet, this is
    /// the channel's only suspension point and it never blocks the cycle.
    pub fn poll(&mut self, time_s: f64) -> Result<Option<f64>, CmdClientError> {
        // Interval gate
        if let Some(last_s) = self.last_poll_time_s {
            if time_s - last_s < self.params.poll_interval_s {
                return Ok(None);
            }
        }
        self.last_poll_time_s = Some(time_s);

        // Scan the directory for the highest-indexed matching artifact
        let entries = std::fs::read_dir(&self.params.artifact_dir)
            .map_err(CmdClientError::DirReadError)?;

        let mut newest: Option<(u64, PathBuf)> = None;

        for entry in entries.flatten() {
            let name = entry.file_name();

            let index = match self.matcher.index_of(&name.to_string_lossy()) {
                Some(i) => i,
                None => continue,
            };

            if newest.as_ref().map_or(true, |(best, _)| index > *best) {
                newest = Some((index, entry.path()));
            }
        }

        let (index, artifact_path) = match newest {
            Some(n) => n,
            None => {
                return Err(CmdClientError::ChannelEmpty(
                    self.params.artifact_dir.clone(),
                ))
            }
        };

        // Read and parse the artifact body
        let body = std::fs::read_to_string(&artifact_path)
            .map_err(|e| CmdClientError::ArtifactReadError(artifact_path.clone(), e))?;

        let command = cmd::parse_cmd_body(&body)
            .map_err(|e| CmdClientError::ParseFailure(artifact_path.clone(), e))?;

        trace!("Command {} from artifact index {}", command, index);

        Ok(Some(command))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn client_for(dir: &std::path::Path, poll_interval_s: f64) -> CmdClient {
        CmdClient::with_params(Params {
            artifact_dir: dir.to_path_buf(),
            artifact_suffix: "sim.txt".into(),
            poll_interval_s,
        })
        .unwrap()
    }

    #[test]
    fn test_selects_highest_index() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("3sim.txt"), "0.3").unwrap();
        std::fs::write(dir.path().join("10sim.txt"), "1.0").unwrap();
        std::fs::write(dir.path().join("2sim.txt"), "0.2").unwrap();

        let mut client = client_for(dir.path(), 0.0);

        assert_eq!(client.poll(0.0).unwrap(), Some(1.0));
    }

    #[test]
    fn test_empty_channel_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client_for(dir.path(), 0.0);

        assert!(matches!(
            client.poll(0.0),
            Err(CmdClientError::ChannelEmpty(_))
        ));

        // An artifact arriving later is picked up on the next poll
        std::fs::write(dir.path().join("0sim.txt"), "0.5").unwrap();
        assert_eq!(client.poll(1.0).unwrap(), Some(0.5));
    }

    #[test]
    fn test_non_matching_names_ignored() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("5other.txt"), "0.9").unwrap();

        let mut client = client_for(dir.path(), 0.0);

        assert!(matches!(
            client.poll(0.0),
            Err(CmdClientError::ChannelEmpty(_))
        ));
    }

    #[test]
    fn test_parse_failure_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("1sim.txt"), "not a number").unwrap();

        let mut client = client_for(dir.path(), 0.0);

        assert!(matches!(
            client.poll(0.0),
            Err(CmdClientError::ParseFailure(_, _))
        ));

        // A good artifact with a higher index recovers the channel
        std::fs::write(dir.path().join("2sim.txt"), "0.25").unwrap();
        assert_eq!(client.poll(1.0).unwrap(), Some(0.25));
    }

    #[test]
    fn test_poll_interval_gate() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("1sim.txt"), "0.5").unwrap();

        let mut client = client_for(dir.path(), 0.1);

        assert_eq!(client.poll(0.0).unwrap(), Some(0.5));

        // Not due yet
        assert_eq!(client.poll(0.02).unwrap(), None);
        assert_eq!(client.poll(0.08).unwrap(), None);

        // Due again
        assert_eq!(client.poll(0.12).unwrap(), Some(0.5));
    }
}
