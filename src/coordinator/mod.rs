//! Telemetry coordinator
//!
//! The coordinator is the single owner of mission state. It runs as one task fed by
//! three unbounded queues and polls them on a fixed tick:
//!
//! ```text
//!   serial events ─┐
//!   commands ──────┼─▶ Coordinator ──▶ snapshots (latest-value watch + opt-in queue)
//!   transmissions ─┘        │ ▲
//!                           ▼ │ replay control / replay events
//!                      ReplayEngine
//! ```
//!
//! Each cycle drains serial events, then commands, then either the replay output (in
//! REPLAY) or the live transmissions (otherwise), emitting a snapshot after every item.
//! The ordered snapshot queue only exists while someone holds its receiver, see
//! [`CoordinatorHandle::snapshot_queue`].
//! Nothing is shared between tasks; the coordinator's state is plain owned data.

mod command;
mod snapshot;


pub use command::{Command, RadioRequest, SerialCommand, SerialEvent};
pub use snapshot::{
    MissionStatus, RadioStatus, ReplayStatus, RocketStatus, SerialStatus, Snapshot, Status,
    TelemetrySnapshot, snapshot_stream,
};

use crate::mission::{MissionRecord, MissionRecorder, append_block};
use crate::protocol::{BlockTriple, DecodedBlock, Transmission};
use crate::replay::{ReplayEvent, ReplaySession};
use crate::types::{DataBlock, MissionState, UpdateRate};
use crate::{Config, Result, TelemetryError};
use futures::Stream;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Decoded telemetry, rebuilt from scratch on every reset.
#[derive(Debug, Clone, Default)]
struct TelemetryState {
    rocket: RocketStatus,
    data: TelemetrySnapshot,
}

/// Connection status as last reported by the serial collaborator.
#[derive(Debug, Clone, Default)]
struct SerialState {
    ports: Vec<String>,
    connected_port: Option<String>,
}

type SnapshotSender = UnboundedSender<Arc<Snapshot>>;

struct Inputs {
    commands: UnboundedReceiver<Command>,
    serial_events: UnboundedReceiver<SerialEvent>,
    transmissions: UnboundedReceiver<String>,
    snapshot_queues: UnboundedReceiver<SnapshotSender>,
}

struct Outputs {
    snapshots: Option<SnapshotSender>,
    latest: watch::Sender<Option<Arc<Snapshot>>>,
    serial: UnboundedSender<SerialCommand>,
}

/// Central state machine of the ground station.
pub struct Coordinator {
    config: Config,
    recorder: MissionRecorder,
    missions: Vec<String>,
    state: MissionState,
    serial: SerialState,
    telemetry: TelemetryState,
    recording: Option<MissionRecord>,
    replay: Option<ReplaySession>,
    last_error: Option<String>,
    inputs: Inputs,
    outputs: Outputs,
}

impl Coordinator {
    /// Create a coordinator and the handle used to talk to it.
    ///
    /// Fails if the missions directory cannot be created or listed.
    pub fn new(config: Config) -> Result<(Self, CoordinatorHandle)> {
        config.validate()?;
        let recorder = MissionRecorder::from_config(&config);
        recorder.ensure_dir().map_err(|e| {
            TelemetryError::config(format!(
                "missions directory {} is unusable: {}",
                recorder.dir().display(),
                e
            ))
        })?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (serial_event_tx, serial_event_rx) = mpsc::unbounded_channel();
        let (transmission_tx, transmission_rx) = mpsc::unbounded_channel();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (serial_tx, serial_rx) = mpsc::unbounded_channel();
        let (latest_tx, latest_rx) = watch::channel(None);

        let handle = CoordinatorHandle {
            commands: command_tx,
            serial_events: serial_event_tx,
            transmissions: transmission_tx,
            snapshot_queues: queue_tx,
            serial_commands: serial_rx,
            latest: latest_rx,
            tick_hz: config.tick_hz(),
            cancel: CancellationToken::new(),
        };

        let mut coordinator = Self {
            config,
            recorder,
            missions: Vec::new(),
            state: MissionState::Idle,
            serial: SerialState::default(),
            telemetry: TelemetryState::default(),
            recording: None,
            replay: None,
            last_error: None,
            inputs: Inputs {
                commands: command_rx,
                serial_events: serial_event_rx,
                transmissions: transmission_rx,
                snapshot_queues: queue_rx,
            },
            outputs: Outputs { snapshots: None, latest: latest_tx, serial: serial_tx },
        };
        coordinator.refresh_missions();

        Ok((coordinator, handle))
    }

    /// Create a coordinator and run it on its own task until the handle is dropped.
    pub fn spawn(config: Config) -> Result<CoordinatorHandle> {
        let (coordinator, handle) = Self::new(config)?;
        let cancel = handle.cancel.clone();
        tokio::spawn(coordinator.run(cancel));
        Ok(handle)
    }

    /// Poll the inputs on the configured tick until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Coordinator started (missions in {}, tick {:?})",
            self.recorder.dir().display(),
            self.config.tick_interval()
        );
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.emit();

        let mut cycles = 0u64;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let processed = self.poll_cycle().await;
            cycles += 1;
            if processed > 0 {
                trace!("Cycle {}: processed {} items", cycles, processed);
            }
        }

        if let Some(mut session) = self.replay.take() {
            session.stop();
        }
        info!("Coordinator stopped after {} cycles", cycles);
    }

    /// Drain every input once, in priority order. Returns the number of items consumed.
    pub async fn poll_cycle(&mut self) -> usize {
        let mut processed = 0;
        self.refresh_missions();

        while let Ok(event) = self.inputs.serial_events.try_recv() {
            self.handle_serial_event(event);
            self.emit();
            processed += 1;
        }

        while let Ok(command) = self.inputs.commands.try_recv() {
            debug!("Command: {:?}", command);
            match self.handle_command(command).await {
                Ok(()) => self.last_error = None,
                Err(e) => {
                    warn!("Command rejected: {}", e);
                    self.last_error = Some(e.to_string());
                }
            }
            self.emit();
            processed += 1;
        }

        if self.state == MissionState::Replay {
            while let Some(event) = self.replay.as_mut().and_then(ReplaySession::try_next_event) {
                if let ReplayEvent::Block(triple) = event {
                    if let Err(e) = self.process_triple(&triple) {
                        warn!("Dropping replayed block {}: {}", triple, e);
                    }
                }
                self.emit();
                processed += 1;
            }

            let mut discarded = 0;
            while self.inputs.transmissions.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                debug!("Discarded {} live transmissions during replay", discarded);
            }
        } else {
            while let Ok(transmission) = self.inputs.transmissions.try_recv() {
                if let Err(e) = self.process_transmission(&transmission) {
                    warn!("Dropping transmission: {}", e);
                }
                self.emit();
                processed += 1;
            }
        }

        processed
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn handle_serial_event(&mut self, event: SerialEvent) {
        match event {
            SerialEvent::Ports(ports) => self.serial.ports = ports,
            SerialEvent::Connected(port) => {
                info!("Radio connected on '{}'", port);
                self.serial.connected_port = Some(port).filter(|port| !port.is_empty());
            }
            SerialEvent::Disconnected => {
                info!("Radio disconnected");
                self.serial.connected_port = None;
            }
        }

        if self.state != MissionState::Replay {
            self.state = self.serial_state();
        }
    }

    /// Apply one command. Rejected commands leave the state untouched.
    pub async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::RadioConnect(port) => self.forward(SerialCommand::Connect(port)),
            Command::RadioDisconnect => self.forward(SerialCommand::Disconnect),
            Command::Update => {}
            Command::RecordStart(name) => self.start_recording(name)?,
            Command::RecordStop => self.stop_recording(),
            Command::ReplayPlay(Some(mission)) => self.start_replay(&mission).await?,
            Command::ReplayPlay(None) => self.active_replay()?.set_speed(1.0),
            Command::ReplayPause => self.active_replay()?.pause(),
            Command::ReplaySpeed(speed) => self.active_replay()?.set_speed(speed),
            Command::ReplayStop => self.stop_replay(),
        }
        Ok(())
    }

    /// Frame, record and decode one live transmission, then apply it atomically.
    pub fn process_transmission(&mut self, hex: &str) -> Result<()> {
        let transmission = Transmission::parse(hex)?;
        trace!(
            "Transmission #{} from {}: {} blocks",
            transmission.header.packet_number,
            transmission.header.call_sign,
            transmission.blocks.len()
        );
        if transmission.blocks.is_empty() {
            return Ok(());
        }

        if let Some(record) = &self.recording {
            for block in &transmission.blocks {
                if let Err(e) = append_block(&record.path, &block.to_triple()) {
                    warn!("Failed to record block to '{}': {}", record.name, e);
                }
            }
        }

        let decoded = transmission.decode_blocks()?;
        self.telemetry.rocket.call_sign = transmission.header.call_sign.as_text();
        for block in decoded {
            self.apply(block);
        }
        Ok(())
    }

    /// Decode and apply one replayed block.
    pub fn process_triple(&mut self, triple: &BlockTriple) -> Result<()> {
        if let Some(record) = self.recording.as_ref().filter(|_| self.config.record_during_replay) {
            if let Err(e) = append_block(&record.path, triple) {
                warn!("Failed to record replayed block to '{}': {}", record.name, e);
            }
        }

        let decoded = triple.decode()?;
        self.apply(decoded);
        Ok(())
    }

    /// Build the current snapshot. The mission list is the one read at the start of the
    /// poll cycle, or after the last recording started.
    pub fn snapshot(&self) -> Snapshot {
        let mission_list = self.missions.clone();

        let (name, epoch) = match (&self.replay, &self.recording) {
            (Some(session), _) => (session.mission().to_string(), session.epoch()),
            (None, Some(record)) => (record.name.clone(), record.epoch),
            (None, None) => (String::new(), 0),
        };

        let replay = match &self.replay {
            Some(session) => ReplayStatus {
                status: session.state(),
                speed: session.speed(),
                mission_list,
            },
            None => ReplayStatus { mission_list, ..Default::default() },
        };

        Snapshot {
            version: self.config.version.clone(),
            org: self.config.org.clone(),
            status: Status {
                mission: MissionStatus {
                    name,
                    epoch,
                    state: self.state,
                    recording: self.recording.is_some(),
                },
                serial: SerialStatus { available_ports: self.serial.ports.clone() },
                radio: RadioStatus {
                    connected: self.serial.connected_port.is_some(),
                    connected_port: self.serial.connected_port.clone().unwrap_or_default(),
                },
                rocket: self.telemetry.rocket.clone(),
            },
            telemetry_data: self.telemetry.data.clone(),
            replay,
            last_error: self.last_error.clone(),
        }
    }

    fn apply(&mut self, block: DecodedBlock) {
        match block {
            DecodedBlock::SignalReport => {
                for request in RadioRequest::SIGNAL_REPORT {
                    match &self.replay {
                        Some(session) if self.state == MissionState::Replay => {
                            session.forward_radio_request(request)
                        }
                        _ => self.forward(SerialCommand::Radio(request)),
                    }
                }
            }
            DecodedBlock::CommandAck { subtype } => {
                debug!("Command block acknowledged (subtype {})", subtype);
            }
            DecodedBlock::Data(block) => {
                self.telemetry.rocket.last_mission_time = i64::from(block.mission_time());
                match block {
                    DataBlock::Status(status) => self.telemetry.rocket.merge(&status),
                    other => {
                        self.telemetry.data.insert(other.name().to_string(), other);
                    }
                }
            }
        }
    }

    fn start_recording(&mut self, name: Option<String>) -> Result<()> {
        if let Some(record) = &self.recording {
            return Err(TelemetryError::RecordingAlreadyActive { name: record.name.clone() });
        }
        if self.state == MissionState::Replay && !self.config.record_during_replay {
            return Err(TelemetryError::invalid_command("recording is disabled during replay"));
        }

        let name = name.unwrap_or_else(|| self.config.default_mission_name.clone());
        let record = self.recorder.create(&name, unix_now())?;
        if self.serial.connected_port.is_none() {
            info!("Recording '{}' without a radio connection", record.name);
        }
        self.recording = Some(record);
        self.refresh_missions();
        Ok(())
    }

    fn stop_recording(&mut self) {
        match self.recording.take() {
            Some(record) => info!("Stopped recording '{}'", record.name),
            None => debug!("Record stop with no active recording"),
        }
    }

    async fn start_replay(&mut self, mission: &str) -> Result<()> {
        self.missions = self.recorder.list_missions()?;
        if !self.missions.iter().any(|name| name == mission) {
            return Err(TelemetryError::ReplayMissionNotFound { name: mission.to_string() });
        }

        let session = ReplaySession::open(
            self.recorder.mission_path(mission),
            mission,
            self.config.replay_block_interval(),
        )
        .await?;

        if let Some(mut previous) = self.replay.take() {
            previous.stop();
        }
        info!("Replaying mission '{}'", mission);
        self.replay = Some(session);
        self.state = MissionState::Replay;
        self.telemetry = TelemetryState::default();
        Ok(())
    }

    fn stop_replay(&mut self) {
        let Some(mut session) = self.replay.take() else {
            debug!("Replay stop with no active replay");
            return;
        };

        session.stop();
        self.telemetry = TelemetryState::default();
        self.state = self.serial_state();
        info!("Replay of '{}' stopped, back to {}", session.mission(), self.state);
    }

    fn active_replay(&mut self) -> Result<&mut ReplaySession> {
        self.replay.as_mut().ok_or_else(|| TelemetryError::invalid_command("no replay is active"))
    }

    fn serial_state(&self) -> MissionState {
        MissionState::from_connected_port(self.serial.connected_port.as_deref())
    }

    fn forward(&self, command: SerialCommand) {
        if self.outputs.serial.send(command).is_err() {
            debug!("Serial command receiver dropped");
        }
    }

    fn refresh_missions(&mut self) {
        match self.recorder.list_missions() {
            Ok(missions) => self.missions = missions,
            Err(e) => warn!("Failed to list missions: {}", e),
        }
    }

    fn emit(&mut self) {
        while let Ok(queue) = self.inputs.snapshot_queues.try_recv() {
            debug!("Snapshot queue attached");
            self.outputs.snapshots = Some(queue);
        }

        let snapshot = Arc::new(self.snapshot());
        if let Some(queue) = &self.outputs.snapshots {
            if queue.send(Arc::clone(&snapshot)).is_err() {
                debug!("Snapshot queue receiver dropped");
                self.outputs.snapshots = None;
            }
        }
        self.outputs.latest.send_replace(Some(snapshot));
    }
}

/// Endpoints for talking to a coordinator.
///
/// Dropping the handle stops a coordinator started with [`Coordinator::spawn`].
pub struct CoordinatorHandle {
    commands: UnboundedSender<Command>,
    serial_events: UnboundedSender<SerialEvent>,
    transmissions: UnboundedSender<String>,
    snapshot_queues: UnboundedSender<SnapshotSender>,
    serial_commands: UnboundedReceiver<SerialCommand>,
    latest: watch::Receiver<Option<Arc<Snapshot>>>,
    tick_hz: f64,
    cancel: CancellationToken,
}

impl CoordinatorHandle {
    pub fn send_command(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| TelemetryError::ChannelClosed { channel: "commands" })
    }

    /// Parse and send a command tuple such as `["telemetry", "record", "start", "alpha"]`.
    pub fn send_command_words<S: AsRef<str>>(&self, words: &[S]) -> Result<()> {
        self.send_command(Command::parse(words)?)
    }

    pub fn report_serial(&self, event: SerialEvent) -> Result<()> {
        self.serial_events
            .send(event)
            .map_err(|_| TelemetryError::ChannelClosed { channel: "serial events" })
    }

    /// Queue a hex transmission received from the radio.
    pub fn push_transmission(&self, hex: impl Into<String>) -> Result<()> {
        self.transmissions
            .send(hex.into())
            .map_err(|_| TelemetryError::ChannelClosed { channel: "transmissions" })
    }

    /// Every snapshot in emission order, starting with the one emitted for the first input
    /// sent after this call.
    ///
    /// The queue is unbounded. Drop the receiver to stop queueing; asking again replaces
    /// the previous queue.
    pub fn snapshot_queue(&self) -> Result<UnboundedReceiver<Arc<Snapshot>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.snapshot_queues
            .send(tx)
            .map_err(|_| TelemetryError::ChannelClosed { channel: "snapshot queues" })?;
        Ok(rx)
    }

    /// Most recent snapshot, if any has been emitted.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.borrow().clone()
    }

    /// Latest-value snapshot stream at the requested rate.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<Snapshot>> + Send + 'static {
        snapshot_stream(self.latest.clone(), rate, self.tick_hz)
    }

    /// Next command for the serial collaborator, without waiting.
    pub fn try_next_serial_command(&mut self) -> Option<SerialCommand> {
        self.serial_commands.try_recv().ok()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        debug!("Dropping coordinator handle");
        self.cancel.cancel();
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
