//! Main drive session executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and modules
//!     - Main loop:
//!         - Cycle timekeeping
//!         - Vehicle stand-in integration (when no host is attached)
//!         - Drive manager processing:
//!             - Channel polling or learning handshake
//!             - Signal conditioning
//!             - Cross track error accumulation and lane sequencing
//!         - Cycle management (fixed rate sleep, overrun monitoring)
//!
//! All session behaviour is selected by the mode given on the command line,
//! the mode is fixed for the lifetime of the process.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    data_store::DataStore,
    drive_mgr::{DriveMgr, DriveMgrError, SessionMode},
    veh_client::{LoopbackParams, LoopbackVehicle},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    raise_error,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// COMMAND LINE
// ---------------------------------------------------------------------------

/// Drive session executable
#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec")]
struct Opt {
    /// Session mode, one of: manual, recording, autonomous, variance_test,
    /// reinforcement, evolutionary
    mode: SessionMode,

    /// Stop after this many cycles instead of running until interrupted
    #[structopt(long)]
    max_cycles: Option<u128>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Session Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- PARSE COMMAND LINE ----

    let opt = Opt::from_args();

    info!("Session mode: {:?}", opt.mode);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let mut drive_mgr =
        DriveMgr::init(opt.mode, &session).wrap_err("Failed to initialise DriveMgr")?;
    info!("DriveMgr init complete");

    // The loopback stand-in drives the session when no host simulation is
    // attached
    let veh_params: LoopbackParams = util::params::load("loopback_veh.toml")
        .wrap_err("Could not load loopback vehicle params")?;
    let mut veh = LoopbackVehicle::from_params(&veh_params);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- VEHICLE STAND-IN ----

        veh.step(CYCLE_PERIOD_S);

        // ---- DRIVE MANAGER PROCESSING ----

        match drive_mgr.proc(&mut veh, &mut ds) {
            Ok(report) => {
                if report.lanes_complete {
                    info!("Variance test lanes complete");
                }
            }
            // A missing lane cannot be recovered by retrying, it's a
            // configuration failure
            Err(DriveMgrError::NoLaneLoaded) => {
                raise_error!("No lane loaded for the current session mode")
            }
            Err(e) => {
                // Other manager errors degrade to holding the last actuator
                // value, just issue the warning and continue.
                warn!("Error during DriveMgr processing: {}", e)
            }
        };

        // 1Hz status line
        if ds.is_1_hz_cycle {
            debug!(
                "Cycle {}: raw {:.3}, actuator angle {:.3} deg, consecutive channel failures {}",
                ds.num_cycles,
                ds.raw_cmd,
                ds.sig_cond_output.actuator_angle_deg,
                ds.num_consec_chan_failures
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;

        if let Some(max_cycles) = opt.max_cycles {
            if ds.num_cycles >= max_cycles {
                info!("Reached the cycle limit ({})", max_cycles);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
