//! Implementations for the DriveMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::str::FromStr;

// Internal
use super::{DriveMgrError, Params};
use crate::cmd_client::CmdClient;
use crate::path::Path;
use crate::rl_server::RlServer;
use crate::sig_cond::{self, SigCond};
use crate::track_err;
use crate::veh_client::VehicleAdapter;
use crate::data_store::DataStore;
use chan_if::results;
use chan_if::telemetry::RlTelemetry;
use util::archive::Archiver;
use util::module::State;
use util::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive session manager state
pub struct DriveMgr {
    params: Params,

    /// Executing mode
    mode: SessionMode,

    /// The lanes available to this session
    lanes: Vec<Path>,

    /// Index of the current executing lane
    lane_index: usize,

    /// The repeating lane switch timer, `None` once all lanes are complete
    lane_timer: Option<LaneTimer>,

    /// Number of lane switches fired so far
    lane_switch_count: u64,

    /// Squared errors accumulated over the current lane
    sq_errors: Vec<f64>,

    /// Simulation time at which the current learning episode started
    episode_start_s: f64,

    /// True once the one-time entry reset has been performed
    started: bool,

    /// The current raw steering command
    raw_cmd: f64,

    report: StatusReport,

    // Components driven by the manager
    sig_cond: SigCond,
    cmd_client: Option<CmdClient>,
    rl_server: Option<RlServer>,
    rec_archiver: Option<Archiver>,

    rng: SmallRng,
    session: Session,
}

/// The repeating lane switch timer.
///
/// Checked once per cycle, firing is cooperative. Rescheduling is gated on
/// lanes remaining, once the guard fails the timer is dropped and no
/// further switches occur.
struct LaneTimer {
    next_fire_s: f64,
    period_s: f64,
}

/// The status report containing monitoring quantities for one cycle.
#[derive(Default, Copy, Clone)]
pub struct StatusReport {
    /// The squared cross track error measured this cycle, if tracking is
    /// enabled
    pub sq_err: Option<f64>,

    /// True if the command channel produced a recoverable failure this
    /// cycle
    pub chan_failure: bool,

    /// True if a telemetry artifact was published this cycle
    pub telemetry_written: bool,

    /// True if the learning episode terminated this cycle
    pub episode_done: bool,

    /// True once the variance test has exhausted its lanes
    pub lanes_complete: bool,
}

/// A single archived recording frame.
#[derive(Serialize, Clone, Copy)]
struct RecFrame {
    time_s: f64,
    raw_input: f64,
    pos_x_m: f64,
    pos_y_m: f64,
    heading_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The session modes the manager can execute.
///
/// The mode is fixed for the duration of the session, with one exception:
/// the variance test becomes `Autonomous` after its first lane switch. Lane
/// sequencing and error accumulation are gated on the armed lane timer,
/// not on the mode, so the remaining lanes still sequence and flush.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Manual,
    Recording,
    Autonomous,
    AutonomousVarianceTest,
    AutonomousReinforcement,
    AutonomousEvolutionary,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SessionMode::Manual),
            "recording" => Ok(SessionMode::Recording),
            "autonomous" => Ok(SessionMode::Autonomous),
            "variance_test" => Ok(SessionMode::AutonomousVarianceTest),
            "reinforcement" => Ok(SessionMode::AutonomousReinforcement),
            "evolutionary" => Ok(SessionMode::AutonomousEvolutionary),
            _ => Err(format!("Unknown session mode: {:?}", s)),
        }
    }
}

impl SessionMode {
    /// True if this mode polls the command channel.
    fn polls_commands(&self) -> bool {
        matches!(
            self,
            SessionMode::Autonomous
                | SessionMode::AutonomousVarianceTest
                | SessionMode::AutonomousEvolutionary
        )
    }

    /// True if this mode needs the learning channel server.
    fn uses_learning_channel(&self) -> bool {
        matches!(
            self,
            SessionMode::AutonomousReinforcement | SessionMode::AutonomousEvolutionary
        )
    }

    /// True if this mode needs lanes loaded.
    fn uses_lanes(&self) -> bool {
        matches!(
            self,
            SessionMode::AutonomousVarianceTest
                | SessionMode::AutonomousReinforcement
                | SessionMode::AutonomousEvolutionary
        )
    }

    /// True if this mode conditions commands into actuator angles.
    fn uses_conditioner(&self) -> bool {
        self.polls_commands() || *self == SessionMode::AutonomousReinforcement
    }
}

impl DriveMgr {
    /// Initialise the drive manager for the given session mode.
    ///
    /// Loads the manager parameters, the lanes the mode requires, and
    /// initialises the components the mode drives.
    pub fn init(mode: SessionMode, session: &Session) -> Result<Self, DriveMgrError> {
        let params: Params =
            util::params::load("drive_mgr.toml").map_err(DriveMgrError::ParamLoadError)?;

        // Load the lanes the mode requires
        let mut lanes = Vec::new();
        if mode.uses_lanes() {
            if params.lane_files.is_empty() {
                return Err(DriveMgrError::NoLanes);
            }

            let mut lanes_dir = util::host::get_steer_sim_root()
                .map_err(|_| DriveMgrError::SwRootNotSet)?;
            lanes_dir.push("lanes");

            for lane_file in &params.lane_files {
                let lane = Path::from_waypoint_file(lanes_dir.join(lane_file))
                    .map_err(|e| DriveMgrError::LaneLoadError(lane_file.clone(), e))?;
                lanes.push(lane);
            }

            info!("{} lane(s) loaded", lanes.len());
        }

        // Initialise the components the mode drives
        let mut sig_cond = SigCond::default();
        if mode.uses_conditioner() {
            sig_cond
                .init("sig_cond.toml", session)
                .map_err(DriveMgrError::SigCondError)?;
        }

        let cmd_client = match mode.polls_commands() {
            true => Some(
                CmdClient::new("cmd_client.toml").map_err(DriveMgrError::CmdClientError)?,
            ),
            false => None,
        };

        let rl_server = match mode.uses_learning_channel() {
            true => {
                Some(RlServer::new("rl_server.toml").map_err(DriveMgrError::RlServerError)?)
            }
            false => None,
        };

        let rec_archiver = match mode {
            SessionMode::Recording => Some(
                Archiver::from_path(session, "recording.csv")
                    .map_err(|e| DriveMgrError::ArchiverInitError(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            params,
            mode,
            lanes,
            lane_index: 0,
            lane_timer: None,
            lane_switch_count: 0,
            sq_errors: Vec::new(),
            episode_start_s: 0f64,
            started: false,
            raw_cmd: 0f64,
            report: StatusReport::default(),
            sig_cond,
            cmd_client,
            rl_server,
            rec_archiver,
            rng: SmallRng::from_entropy(),
            session: session.clone(),
        })
    }

    /// The mode the manager is currently executing.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Process the drive manager for one cycle.
    ///
    /// Recoverable channel conditions are absorbed here, they degrade the
    /// cycle to holding the last known actuator value and never propagate
    /// as errors.
    pub fn proc(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &mut DataStore,
    ) -> Result<StatusReport, DriveMgrError> {
        self.report = StatusReport::default();

        match self.mode {
            SessionMode::Manual => (),
            SessionMode::Recording => self.mode_recording(veh, ds),
            SessionMode::Autonomous => self.mode_autonomous(veh, ds)?,
            SessionMode::AutonomousVarianceTest => self.mode_variance_test(veh, ds)?,
            SessionMode::AutonomousReinforcement => self.mode_reinforcement(veh, ds)?,
            SessionMode::AutonomousEvolutionary => self.mode_evolutionary(veh, ds)?,
        }

        Ok(self.report)
    }

    /// Mode recording.
    ///
    /// Waits cooperatively for the host to enable recording, then archives
    /// one frame of raw input and vehicle state per cycle.
    fn mode_recording(&mut self, veh: &mut dyn VehicleAdapter, ds: &DataStore) {
        if !veh.recording_enabled() {
            return;
        }

        let pose = veh.pose();

        let frame = RecFrame {
            time_s: ds.sim_time_s,
            raw_input: veh.manual_input(),
            pos_x_m: pose.position_m[0],
            pos_y_m: pose.position_m[1],
            heading_rad: pose.heading_rad,
        };

        if let Some(ref mut archiver) = self.rec_archiver {
            if let Err(e) = archiver.serialise(frame) {
                warn!("Could not archive recording frame: {}", e);
            }
        }
    }

    /// Mode autonomous.
    ///
    /// Polls the command channel and conditions the command into an
    /// actuator angle. Also services the lane timer and error accumulation
    /// while a variance test's timer remains armed, the test's mode
    /// downgrade leaves sequencing gated on the timer rather than the mode.
    fn mode_autonomous(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &mut DataStore,
    ) -> Result<(), DriveMgrError> {
        self.check_lane_timer(veh, ds)?;
        self.poll_command(ds);
        self.condition_and_steer(veh, ds);

        if self.lane_timer.is_some() {
            self.accumulate_error(veh, ds);
        }

        Ok(())
    }

    /// Mode variance test.
    ///
    /// On entry resets to the first lane and arms the repeating lane timer,
    /// then behaves as autonomous with error tracking.
    fn mode_variance_test(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &mut DataStore,
    ) -> Result<(), DriveMgrError> {
        if !self.started {
            self.started = true;

            // The timer's first firing happens immediately and performs the
            // entry reset to lane 0
            self.lane_timer = Some(LaneTimer {
                next_fire_s: ds.sim_time_s,
                period_s: self.params.time_spent_on_lane_s,
            });

            info!(
                "Variance test started: {} lane(s), {} s per lane",
                self.lanes.len(),
                self.params.time_spent_on_lane_s
            );
        }

        self.mode_autonomous(veh, ds)
    }

    /// Mode reinforcement.
    ///
    /// Runs the learning handshake each cycle instead of the polling
    /// protocol.
    fn mode_reinforcement(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &mut DataStore,
    ) -> Result<(), DriveMgrError> {
        if !self.started {
            self.started = true;
            self.reset_to_lane_start(veh, self.params.randomize_episode_start)?;
            self.episode_start_s = ds.sim_time_s;
        }

        // Read the trainer's action. Malformed artifacts degrade to "no
        // action this cycle".
        let action = match self.rl_server.as_ref() {
            Some(server) => match server.read_action() {
                Ok(a) => a,
                Err(e) => {
                    trace!("Learning channel action failure: {}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(action) = action {
            self.raw_cmd = action.steer_sign() * self.params.rl_steer_magnitude;
        }

        self.condition_and_steer(veh, ds);

        // Only a handled action produces a transition worth publishing
        if action.is_none() {
            return Ok(());
        }

        let sq_err = match self.current_lane() {
            Some(lane) => track_err::estimate(lane, veh.pose().position_m),
            None => return Err(DriveMgrError::NoLaneLoaded),
        };

        let sq_err = match sq_err {
            Ok(e) => e,
            Err(e) => {
                // Skip the telemetry write rather than publish a bad reward
                trace!("Cross track estimate failed: {}", e);
                return Ok(());
            }
        };

        self.report.sq_err = Some(sq_err);

        // The unwrap here is safe since init always builds the server for
        // the reinforcement mode
        let server = self.rl_server.as_mut().unwrap();

        let done = server.check_done(
            sq_err,
            veh.speed_ms(),
            ds.sim_time_s,
            self.episode_start_s,
        );

        let telemetry = RlTelemetry {
            actuator_angle_deg: ds.last_actuator_angle_deg,
            reward: 1f64 - sq_err,
            done,
        };

        match server.write_telemetry(&telemetry) {
            Ok(true) => self.report.telemetry_written = true,
            // The previous transition is still unconsumed, never overwrite
            Ok(false) => trace!("Telemetry still pending, transition not published"),
            Err(e) => warn!("Could not publish telemetry: {}", e),
        }

        if done {
            info!("Episode terminated, resetting to lane start");
            self.report.episode_done = true;

            self.reset_to_lane_start(veh, self.params.randomize_episode_start)?;
            self.episode_start_s = ds.sim_time_s;
            self.raw_cmd = 0f64;
            self.sig_cond.reset();
            if let Some(server) = self.rl_server.as_mut() {
                server.reset_episode();
            }
        }

        Ok(())
    }

    /// Mode evolutionary.
    ///
    /// Autonomous polling plus the edge-triggered reset flag.
    fn mode_evolutionary(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &mut DataStore,
    ) -> Result<(), DriveMgrError> {
        if !self.started {
            self.started = true;
            self.reset_to_lane_start(veh, false)?;
        }

        self.poll_command(ds);
        self.condition_and_steer(veh, ds);

        let flag = match self.rl_server.as_ref() {
            Some(server) => server.take_reset_flag(),
            None => Ok(false),
        };

        match flag {
            Ok(true) => {
                info!("Reset flag consumed, resetting to lane start");
                self.reset_to_lane_start(veh, false)?;
                self.raw_cmd = 0f64;
                self.sig_cond.reset();
            }
            Ok(false) => (),
            Err(e) => warn!("Could not consume reset flag: {}", e),
        }

        Ok(())
    }

    /// Poll the command channel for a fresh raw command.
    ///
    /// All channel failures are recoverable: the raw command is held and
    /// the poll retried next cycle.
    fn poll_command(&mut self, ds: &mut DataStore) {
        let client = match self.cmd_client.as_mut() {
            Some(c) => c,
            None => return,
        };

        match client.poll(ds.sim_time_s) {
            Ok(Some(cmd)) => {
                self.raw_cmd = cmd;
                ds.raw_cmd = cmd;
                ds.num_consec_chan_failures = 0;
            }
            // Not due yet, hold the current command
            Ok(None) => (),
            Err(e) => {
                trace!("Command channel failure, retrying next cycle: {}", e);
                ds.num_consec_chan_failures += 1;
                self.report.chan_failure = true;
            }
        }
    }

    /// Condition the current raw command and apply the resulting actuator
    /// angle to the vehicle.
    fn condition_and_steer(&mut self, veh: &mut dyn VehicleAdapter, ds: &mut DataStore) {
        let input = sig_cond::InputData {
            raw_cmd: self.raw_cmd,
            time_s: ds.sim_time_s,
        };

        match self.sig_cond.proc(&input) {
            Ok((output, report)) => {
                ds.sig_cond_output = output;
                ds.sig_cond_status_rpt = report;
                ds.last_actuator_angle_deg = output.actuator_angle_deg;

                veh.apply_steering(output.actuator_angle_deg);
            }
            Err(e) => {
                // Degrade to holding the last known actuator value
                warn!("Signal conditioner failure, holding last angle: {}", e);
                veh.apply_steering(ds.last_actuator_angle_deg);
            }
        }
    }

    /// Accumulate the cross track error for this cycle.
    fn accumulate_error(&mut self, veh: &dyn VehicleAdapter, _ds: &DataStore) {
        let lane = match self.current_lane() {
            Some(l) => l,
            None => return,
        };

        match track_err::estimate(lane, veh.pose().position_m) {
            Ok(sq_err) => {
                self.sq_errors.push(sq_err);
                self.report.sq_err = Some(sq_err);
            }
            Err(e) => trace!("Cross track estimate failed: {}", e),
        }
    }

    /// Service the lane timer, firing a lane switch if it is due.
    fn check_lane_timer(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &DataStore,
    ) -> Result<(), DriveMgrError> {
        let due = match self.lane_timer {
            Some(ref timer) => ds.sim_time_s >= timer.next_fire_s,
            None => false,
        };

        if due {
            self.switch_lanes(veh, ds)?;
        }

        Ok(())
    }

    /// Perform one firing of the lane switch timer.
    ///
    /// The first firing selects lane 0. Subsequent firings flush the
    /// completed lane's errors and advance. Rescheduling is gated on lanes
    /// remaining, the final firing drops the timer entirely.
    fn switch_lanes(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        ds: &DataStore,
    ) -> Result<(), DriveMgrError> {
        let first = self.lane_switch_count == 0;
        self.lane_switch_count += 1;

        if !first {
            self.flush_results();
            self.lane_index += 1;
        }

        if self.lane_index < self.lanes.len() {
            info!("Switching to lane {}", self.lane_index);

            self.reset_to_lane_start(veh, false)?;

            // Reschedule only while lanes remain
            if let Some(ref mut timer) = self.lane_timer {
                timer.next_fire_s = ds.sim_time_s + timer.period_s;
            }
        }
        else {
            info!("All lanes complete, lane timer disarmed");
            self.lane_timer = None;
            self.report.lanes_complete = true;
        }

        // The variance test is indistinguishable from autonomous once the
        // timer is sequencing lanes on its own
        if first && self.mode == SessionMode::AutonomousVarianceTest {
            self.mode = SessionMode::Autonomous;
        }

        Ok(())
    }

    /// Flush the accumulated squared errors for the lane just completed.
    ///
    /// Writes the results artifact, logs and saves the summary, then
    /// clears the accumulator. Write failures are logged, losing one
    /// lane's results must not end the session.
    fn flush_results(&mut self) {
        let body = match results::format_results(&self.sq_errors) {
            Some(b) => b,
            None => {
                warn!("No errors accumulated for lane {}", self.lane_index);
                return;
            }
        };

        let artifact_path = self
            .params
            .results_dir
            .join(format!("results{}.txt", self.lane_index));

        if let Err(e) = std::fs::write(&artifact_path, body) {
            warn!("Could not write results artifact {:?}: {}", artifact_path, e);
        }

        if let Some(summary) = results::summarise(&self.sq_errors) {
            info!(
                "Lane {} complete: {} samples, mean {:.7}, std dev {:.7}",
                self.lane_index, summary.num_samples, summary.mean, summary.std_dev
            );

            self.session
                .save(format!("lane_{}_summary.json", self.lane_index), &summary);
        }

        self.sq_errors.clear();
    }

    /// Reset the vehicle to the start of the current lane.
    ///
    /// Selects the lane's start point (or a random point along it when
    /// randomisation is requested), orients the heading towards the next
    /// point, and teleports with zero velocity. This is the single
    /// synchronisation point with the host's physics.
    fn reset_to_lane_start(
        &mut self,
        veh: &mut dyn VehicleAdapter,
        randomize: bool,
    ) -> Result<(), DriveMgrError> {
        let lane = match self.lanes.get(self.lane_index) {
            Some(l) => l,
            None => return Err(DriveMgrError::NoLaneLoaded),
        };

        // The last point has no successor to orient towards so it is never
        // a valid start
        let start_index = match randomize {
            true => self.rng.gen_range(0..lane.get_num_points() - 1),
            false => 0,
        };

        let heading_rad = lane.heading_at(start_index).unwrap_or(0f64);

        veh.teleport(lane.points_m[start_index], heading_rad);

        trace!(
            "Reset to lane {} point {} heading {:.3} rad",
            self.lane_index,
            start_index,
            heading_rad
        );

        Ok(())
    }

    /// The lane the session is currently evaluating against.
    fn current_lane(&self) -> Option<&Path> {
        self.lanes.get(self.lane_index)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd_client;
    use crate::rl_server::{self, TerminationPolicy};
    use crate::veh_client::LoopbackVehicle;
    use nalgebra::Vector2;

    const CYCLE_PERIOD_S: f64 = 0.02;

    /// A straight lane along +x at y = 0
    fn straight_lane(num_points: usize) -> Path {
        Path {
            points_m: (0..num_points)
                .map(|i| Vector2::new(i as f64, 0.0))
                .collect(),
        }
    }

    fn test_session(dir: &std::path::Path) -> Session {
        // Sessions built directly, tests don't touch the process-wide epoch
        Session {
            session_root: dir.to_path_buf(),
            arch_root: dir.to_path_buf(),
            log_file_path: dir.join("test.log"),
        }
    }

    fn mgr_with(
        mode: SessionMode,
        lanes: Vec<Path>,
        params: Params,
        cmd_client: Option<CmdClient>,
        rl_server: Option<RlServer>,
        session: Session,
    ) -> DriveMgr {
        DriveMgr {
            params,
            mode,
            lanes,
            lane_index: 0,
            lane_timer: None,
            lane_switch_count: 0,
            sq_errors: Vec::new(),
            episode_start_s: 0f64,
            started: false,
            raw_cmd: 0f64,
            report: StatusReport::default(),
            sig_cond: SigCond::default(),
            cmd_client,
            rl_server,
            rec_archiver: None,
            rng: SmallRng::seed_from_u64(0),
            session,
        }
    }

    fn test_params(results_dir: &std::path::Path) -> Params {
        Params {
            lane_files: vec![],
            time_spent_on_lane_s: 0.1,
            randomize_episode_start: false,
            rl_steer_magnitude: 0.5,
            results_dir: results_dir.to_path_buf(),
        }
    }

    fn run_cycles(
        mgr: &mut DriveMgr,
        veh: &mut LoopbackVehicle,
        ds: &mut DataStore,
        num_cycles: u64,
    ) {
        for _ in 0..num_cycles {
            ds.cycle_start(1.0 / CYCLE_PERIOD_S);
            veh.step(CYCLE_PERIOD_S);
            mgr.proc(veh, ds).unwrap();
            ds.num_cycles += 1;
        }
    }

    #[test]
    fn test_variance_test_sequences_lanes() {
        let dir = tempfile::tempdir().unwrap();
        let cmd_dir = tempfile::tempdir().unwrap();

        std::fs::write(cmd_dir.path().join("0sim.txt"), "0.0").unwrap();

        let client = CmdClient::with_params(cmd_client::Params {
            artifact_dir: cmd_dir.path().to_path_buf(),
            artifact_suffix: "sim.txt".into(),
            poll_interval_s: 0.0,
        })
        .unwrap();

        let mut mgr = mgr_with(
            SessionMode::AutonomousVarianceTest,
            vec![straight_lane(5), straight_lane(5)],
            test_params(dir.path()),
            Some(client),
            None,
            test_session(dir.path()),
        );

        let mut veh = LoopbackVehicle::new(2.0, 1.0);
        let mut ds = DataStore::default();

        // First cycle: entry arms the timer, fires immediately, resets to
        // lane 0, downgrades to autonomous
        run_cycles(&mut mgr, &mut veh, &mut ds, 1);
        assert_eq!(mgr.mode(), SessionMode::Autonomous);
        assert_eq!(mgr.lane_index, 0);
        assert!(mgr.lane_timer.is_some());

        // 0.1 s per lane at 0.02 s cycles: lane 0 runs for 5 more cycles
        // before the next firing advances to lane 1
        run_cycles(&mut mgr, &mut veh, &mut ds, 5);
        assert_eq!(mgr.lane_index, 1);

        // Lane 0's results artifact was flushed
        let results0 = std::fs::read_to_string(dir.path().join("results0.txt")).unwrap();
        assert!(results0.contains("Standard deviation:"));

        // After lane 1's period the timer disarms and stays disarmed
        run_cycles(&mut mgr, &mut veh, &mut ds, 5);
        assert!(mgr.lane_timer.is_none());
        assert!(dir.path().join("results1.txt").exists());

        let lane_index_after = mgr.lane_index;
        run_cycles(&mut mgr, &mut veh, &mut ds, 20);
        assert_eq!(mgr.lane_index, lane_index_after);
        assert!(mgr.lane_timer.is_none());

        // Accumulation stopped with the timer
        assert!(mgr.sq_errors.is_empty());
    }

    #[test]
    fn test_reinforcement_handshake() {
        let dir = tempfile::tempdir().unwrap();
        let chan_dir = tempfile::tempdir().unwrap();

        let server = RlServer::with_params(rl_server::Params {
            action_file: chan_dir.path().join("action.txt"),
            telemetry_file: chan_dir.path().join("info.txt"),
            reset_flag_file: chan_dir.path().join("reset.txt"),
            termination: TerminationPolicy::ErrorThreshold,
            grace_period_s: 1.0,
            low_speed_threshold_ms: 0.1,
            low_speed_duration_s: 0.5,
            error_failure_threshold: 100.0,
        });

        let mut mgr = mgr_with(
            SessionMode::AutonomousReinforcement,
            vec![straight_lane(10)],
            test_params(dir.path()),
            None,
            Some(server),
            test_session(dir.path()),
        );

        // Start with a negative raw command
        mgr.raw_cmd = -0.5;

        let mut veh = LoopbackVehicle::new(2.0, 1.0);
        let mut ds = DataStore::default();

        // A steer-positive action must flip the raw command sign within one
        // cycle and publish telemetry
        std::fs::write(chan_dir.path().join("action.txt"), "2").unwrap();
        run_cycles(&mut mgr, &mut veh, &mut ds, 1);

        assert!(mgr.raw_cmd > 0.0);
        assert!(chan_dir.path().join("info.txt").exists());

        let first_body =
            std::fs::read_to_string(chan_dir.path().join("info.txt")).unwrap();

        // While the telemetry is unconsumed further cycles must not rewrite
        // it
        run_cycles(&mut mgr, &mut veh, &mut ds, 3);
        let body_after =
            std::fs::read_to_string(chan_dir.path().join("info.txt")).unwrap();
        assert_eq!(first_body, body_after);

        // Once the trainer consumes it the next cycle publishes again
        std::fs::remove_file(chan_dir.path().join("info.txt")).unwrap();
        run_cycles(&mut mgr, &mut veh, &mut ds, 1);
        assert!(chan_dir.path().join("info.txt").exists());
    }

    #[test]
    fn test_reinforcement_episode_termination() {
        let dir = tempfile::tempdir().unwrap();
        let chan_dir = tempfile::tempdir().unwrap();

        let server = RlServer::with_params(rl_server::Params {
            action_file: chan_dir.path().join("action.txt"),
            telemetry_file: chan_dir.path().join("info.txt"),
            reset_flag_file: chan_dir.path().join("reset.txt"),
            termination: TerminationPolicy::ErrorThreshold,
            grace_period_s: 1.0,
            low_speed_threshold_ms: 0.1,
            low_speed_duration_s: 0.5,
            // Tiny threshold so wandering off the lane terminates quickly
            error_failure_threshold: 0.01,
        });

        let mut mgr = mgr_with(
            SessionMode::AutonomousReinforcement,
            vec![straight_lane(10)],
            test_params(dir.path()),
            None,
            Some(server),
            test_session(dir.path()),
        );

        let mut veh = LoopbackVehicle::new(2.0, 1.0);
        let mut ds = DataStore::default();

        // Keep steering hard positive, the vehicle curves off the lane
        std::fs::write(chan_dir.path().join("action.txt"), "2").unwrap();

        let mut saw_done = false;
        for _ in 0..500 {
            ds.cycle_start(1.0 / CYCLE_PERIOD_S);
            veh.step(CYCLE_PERIOD_S);
            let report = mgr.proc(&mut veh, &mut ds).unwrap();
            ds.num_cycles += 1;

            // Consume telemetry like a trainer would
            let _ = std::fs::remove_file(chan_dir.path().join("info.txt"));

            if report.episode_done {
                saw_done = true;
                break;
            }
        }

        assert!(saw_done);

        // The reset teleported the vehicle back to the lane start
        assert_eq!(veh.pose().position_m, Vector2::new(0.0, 0.0));
        assert_eq!(veh.speed_ms(), 0.0);
    }

    #[test]
    fn test_evolutionary_reset_flag() {
        let dir = tempfile::tempdir().unwrap();
        let cmd_dir = tempfile::tempdir().unwrap();
        let chan_dir = tempfile::tempdir().unwrap();

        std::fs::write(cmd_dir.path().join("0sim.txt"), "0.4").unwrap();

        let client = CmdClient::with_params(cmd_client::Params {
            artifact_dir: cmd_dir.path().to_path_buf(),
            artifact_suffix: "sim.txt".into(),
            poll_interval_s: 0.0,
        })
        .unwrap();

        let server = RlServer::with_params(rl_server::Params {
            action_file: chan_dir.path().join("action.txt"),
            telemetry_file: chan_dir.path().join("info.txt"),
            reset_flag_file: chan_dir.path().join("reset.txt"),
            termination: TerminationPolicy::LowSpeed,
            grace_period_s: 1.0,
            low_speed_threshold_ms: 0.1,
            low_speed_duration_s: 0.5,
            error_failure_threshold: 1.0,
        });

        let mut mgr = mgr_with(
            SessionMode::AutonomousEvolutionary,
            vec![straight_lane(10)],
            test_params(dir.path()),
            Some(client),
            Some(server),
            test_session(dir.path()),
        );

        let mut veh = LoopbackVehicle::new(2.0, 1.0);
        let mut ds = DataStore::default();

        // Drive away from the start under the polled command
        run_cycles(&mut mgr, &mut veh, &mut ds, 100);
        assert!(veh.pose().position_m.norm() > 0.1);

        // Drop the reset flag, the next cycle teleports back to the start
        // and consumes the flag
        std::fs::write(chan_dir.path().join("reset.txt"), "").unwrap();
        run_cycles(&mut mgr, &mut veh, &mut ds, 1);

        assert_eq!(veh.pose().position_m, Vector2::new(0.0, 0.0));
        assert!(!chan_dir.path().join("reset.txt").exists());
    }

    #[test]
    fn test_recording_waits_for_enable() {
        let dir = tempfile::tempdir().unwrap();

        let mut mgr = mgr_with(
            SessionMode::Recording,
            vec![],
            test_params(dir.path()),
            None,
            None,
            test_session(dir.path()),
        );

        // Archiver writing into the test session's root
        mgr.rec_archiver = Some(
            Archiver::from_path(&mgr.session.clone(), "recording.csv").unwrap(),
        );

        let mut veh = LoopbackVehicle::new(2.0, 1.0);
        let mut ds = DataStore::default();

        // Recording disabled, nothing is archived
        run_cycles(&mut mgr, &mut veh, &mut ds, 5);
        let len = std::fs::metadata(dir.path().join("recording.csv"))
            .unwrap()
            .len();
        assert_eq!(len, 0);

        // Enable recording, frames start flowing
        veh.set_recording_enabled(true);
        veh.set_manual_input(0.25);
        run_cycles(&mut mgr, &mut veh, &mut ds, 5);
        let len = std::fs::metadata(dir.path().join("recording.csv"))
            .unwrap()
            .len();
        assert!(len > 0);
    }
}
