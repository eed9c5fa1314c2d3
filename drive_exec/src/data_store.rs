//! # Data Store

use crate::sig_cond;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // Signal conditioning
    pub sig_cond_output: sig_cond::OutputData,
    pub sig_cond_status_rpt: sig_cond::StatusReport,

    /// The last actuator angle successfully produced. Held and re-applied
    /// when a cycle's channel processing fails.
    pub last_actuator_angle_deg: f64,

    /// The most recent raw command from the channel
    pub raw_cmd: f64,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive cycles on which the command channel produced
    /// a recoverable failure
    pub num_consec_chan_failures: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Clear items that need wiping at the start of the cycle and update
    /// the cycle timekeeping.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;
        self.sim_time_s = self.num_cycles as f64 / cycle_frequency_hz;

        self.sig_cond_status_rpt = sig_cond::StatusReport::default();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cycle_timekeeping() {
        let mut ds = DataStore::default();

        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);
        assert_eq!(ds.sim_time_s, 0.0);

        ds.num_cycles = 25;
        ds.cycle_start(50.0);
        assert!(!ds.is_1_hz_cycle);
        assert_eq!(ds.sim_time_s, 0.5);

        ds.num_cycles = 100;
        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);
        assert_eq!(ds.sim_time_s, 2.0);
    }
}
