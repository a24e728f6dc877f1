//! Replay engine
//!
//! The engine is a task of its own that reads a recorded mission and emits its block
//! triples at a controllable pace. It talks to its owner only through channels:
//!
//! ```text
//!   owner ── ReplayControl ──▶ engine task ── ReplayEvent ──▶ owner
//! ```
//!
//! Playback moves `Playing ⇄ Paused`, reaches `Finished` at the end of the log and
//! idles there until stopped. Stopping is fire-and-forget: the owner cancels the task,
//! drains anything already queued and drops its ends of the channels.

use super::source::TripleSource;
use crate::coordinator::RadioRequest;
use crate::mission::MissionLogReader;
use crate::protocol::BlockTriple;
use crate::{Result, TelemetryError};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Consecutive read failures after which the engine treats the log as ended.
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Control messages accepted by a running engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayControl {
    /// Playback speed multiplier. Zero pauses; negative values are treated as zero.
    Speed(f64),
    /// Signal report request raised by a replayed CONTROL block.
    Radio(RadioRequest),
}

/// Messages emitted by a running engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    Block(BlockTriple),
    /// End of the log was reached. Emitted once.
    Finished,
}

/// Playback state reported in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// Clamp a requested speed to the accepted range. NaN and negatives mean paused.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed > 0.0 { speed } else { 0.0 }
}

/// Delay between emissions at `speed`, or `None` when paused.
pub fn pacing_delay(block_interval: Duration, speed: f64) -> Option<Duration> {
    let speed = clamp_speed(speed);
    if speed == 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(block_interval.as_secs_f64() / speed).unwrap_or(Duration::MAX))
}

/// Engine task state. Owns the source, so the log file closes when the task ends.
pub struct ReplayEngine<S> {
    source: S,
    speed: f64,
    state: PlaybackState,
    block_interval: Duration,
    controls: UnboundedReceiver<ReplayControl>,
    events: UnboundedSender<ReplayEvent>,
    cancel: CancellationToken,
}

impl<S: TripleSource> ReplayEngine<S> {
    /// Spawn an engine playing `source` at speed 1.0 and return the owner's handle.
    pub fn spawn(source: S, mission: impl Into<String>, block_interval: Duration) -> ReplaySession {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let engine = ReplayEngine {
            source,
            speed: 1.0,
            state: PlaybackState::Playing,
            block_interval,
            controls: control_rx,
            events: event_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(engine.run());

        ReplaySession {
            mission: mission.into(),
            epoch: 0,
            speed: 1.0,
            state: PlaybackState::Playing,
            controls: control_tx,
            events: event_rx,
            cancel,
        }
    }

    async fn run(mut self) {
        info!("Replay engine started");
        let mut emitted = 0u64;
        let mut error_count = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if !self.drain_controls() {
                break;
            }

            if self.state != PlaybackState::Playing {
                // Emission is suspended until a control message or cancellation arrives
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    control = self.controls.recv() => match control {
                        Some(control) => self.apply(control),
                        None => break,
                    },
                }
                continue;
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.source.next_triple() => result,
            };

            match result {
                Ok(Some(triple)) => {
                    error_count = 0;
                    emitted += 1;
                    trace!("Replaying block {}: {}", emitted, triple);
                    if self.events.send(ReplayEvent::Block(triple)).is_err() {
                        debug!("Replay output closed");
                        break;
                    }
                }
                Ok(None) => {
                    self.finish(emitted);
                    continue;
                }
                Err(e) => {
                    error_count += 1;
                    warn!("Skipping unreadable mission log entry: {}", e);
                    if error_count >= MAX_CONSECUTIVE_ERRORS {
                        warn!("Too many consecutive read errors ({}), ending replay", error_count);
                        self.finish(emitted);
                    }
                    continue;
                }
            }

            let Some(delay) = pacing_delay(self.block_interval, self.speed) else {
                continue;
            };
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state = PlaybackState::Stopped;
        info!("Replay engine stopped after {} blocks", emitted);
    }

    /// Apply queued control messages. Returns false once the owner is gone.
    fn drain_controls(&mut self) -> bool {
        loop {
            match self.controls.try_recv() {
                Ok(control) => self.apply(control),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, control: ReplayControl) {
        match control {
            ReplayControl::Speed(speed) => {
                self.speed = clamp_speed(speed);
                if self.state != PlaybackState::Finished {
                    self.state = if self.speed > 0.0 {
                        PlaybackState::Playing
                    } else {
                        PlaybackState::Paused
                    };
                }
                debug!("Replay speed set to {}x ({:?})", self.speed, self.state);
            }
            ReplayControl::Radio(request) => {
                debug!("No radio during replay, dropping '{}'", request);
            }
        }
    }

    fn finish(&mut self, emitted: u64) {
        self.state = PlaybackState::Finished;
        info!("Replay reached end of log after {} blocks", emitted);
        let _ = self.events.send(ReplayEvent::Finished);
    }
}

/// Owner's handle on a running replay.
///
/// Dropping the handle stops the engine.
pub struct ReplaySession {
    mission: String,
    epoch: u64,
    speed: f64,
    state: PlaybackState,
    controls: UnboundedSender<ReplayControl>,
    events: UnboundedReceiver<ReplayEvent>,
    cancel: CancellationToken,
}

impl ReplaySession {
    /// Open a mission log and start replaying it.
    pub async fn open<P: AsRef<Path>>(
        path: P,
        mission: impl Into<String>,
        block_interval: Duration,
    ) -> Result<Self> {
        let mission = mission.into();
        let reader = MissionLogReader::open(path).await.map_err(|err| match err {
            TelemetryError::File { source, .. } if source.kind() == ErrorKind::NotFound => {
                TelemetryError::ReplayMissionNotFound { name: mission.clone() }
            }
            other => other,
        })?;
        let epoch = reader.header().epoch;
        let mut session = ReplayEngine::spawn(reader, mission, block_interval);
        session.epoch = epoch;
        Ok(session)
    }

    pub fn mission(&self) -> &str {
        &self.mission
    }

    /// Creation time of the mission being replayed, Unix seconds.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Change playback speed. Takes effect at the engine's next pacing decision.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_speed(speed);
        if self.state != PlaybackState::Finished && self.state != PlaybackState::Stopped {
            self.state =
                if self.speed > 0.0 { PlaybackState::Playing } else { PlaybackState::Paused };
        }
        self.send(ReplayControl::Speed(self.speed));
    }

    pub fn pause(&mut self) {
        self.set_speed(0.0);
    }

    /// Forward a signal report request raised by a replayed CONTROL block.
    pub fn forward_radio_request(&self, request: RadioRequest) {
        self.send(ReplayControl::Radio(request));
    }

    /// Next queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<ReplayEvent> {
        let event = self.events.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    /// Wait for the next event. `None` once the engine has stopped and the queue is empty.
    pub async fn next_event(&mut self) -> Option<ReplayEvent> {
        let event = self.events.recv().await?;
        self.observe(&event);
        Some(event)
    }

    /// Stop the engine without waiting for it, discarding queued output. Idempotent.
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            info!("Stopping replay of '{}'", self.mission);
        }
        self.cancel.cancel();
        self.events.close();
        while self.events.try_recv().is_ok() {}
        self.state = PlaybackState::Stopped;
    }

    fn observe(&mut self, event: &ReplayEvent) {
        if *event == ReplayEvent::Finished {
            self.state = PlaybackState::Finished;
        }
    }

    fn send(&self, control: ReplayControl) {
        if self.controls.send(control).is_err() {
            debug!("Replay engine for '{}' already stopped", self.mission);
        }
    }
}

impl Drop for ReplaySession {
    fn drop(&mut self) {
        debug!("Dropping replay session");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::MemorySource;
    use std::sync::Arc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn triples(count: u8) -> Vec<BlockTriple> {
        (0..count)
            .map(|i| BlockTriple { block_type: 2, block_subtype: 3, payload_hex: format!("{:08X}", i) })
            .collect()
    }

    async fn next_block(session: &mut ReplaySession) -> BlockTriple {
        match timeout(WAIT, session.next_event()).await.expect("replay event timed out") {
            Some(ReplayEvent::Block(triple)) => triple,
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn emits_in_order_then_finishes_and_idles() {
        let mut session =
            ReplayEngine::spawn(MemorySource::new(triples(3)), "alpha", Duration::from_millis(1));

        for expected in triples(3) {
            assert_eq!(next_block(&mut session).await, expected);
        }
        let finished = timeout(WAIT, session.next_event()).await.unwrap();
        assert_eq!(finished, Some(ReplayEvent::Finished));
        assert_eq!(session.state(), PlaybackState::Finished);

        // Idle at end of log: no restart, nothing further
        let idle = timeout(Duration::from_millis(50), session.next_event()).await;
        assert!(idle.is_err());

        session.stop();
        assert_eq!(session.state(), PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn pause_preserves_cursor() {
        let mut session =
            ReplayEngine::spawn(MemorySource::new(triples(5)), "beta", Duration::from_millis(100));
        let all = triples(5);

        assert_eq!(next_block(&mut session).await, all[0]);
        session.pause();
        assert_eq!(session.state(), PlaybackState::Paused);

        let paused = timeout(Duration::from_millis(300), session.next_event()).await;
        assert!(paused.is_err(), "paused engine must not emit");

        session.set_speed(2.0);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(next_block(&mut session).await, all[1]);
        assert_eq!(next_block(&mut session).await, all[2]);
        session.stop();
    }

    #[tokio::test]
    async fn negative_speed_pauses() {
        let mut session =
            ReplayEngine::spawn(MemorySource::new(triples(3)), "gamma", Duration::from_millis(100));
        next_block(&mut session).await;

        session.set_speed(-4.0);
        assert_eq!(session.speed(), 0.0);
        assert_eq!(session.state(), PlaybackState::Paused);
        session.stop();
    }

    struct ProbeSource {
        inner: MemorySource,
        _probe: Arc<()>,
    }

    #[async_trait::async_trait]
    impl TripleSource for ProbeSource {
        async fn next_triple(&mut self) -> Result<Option<BlockTriple>> {
            self.inner.next_triple().await
        }
    }

    #[tokio::test]
    async fn stop_releases_source_and_drains_output() {
        let probe = Arc::new(());
        let source = ProbeSource { inner: MemorySource::new(triples(50)), _probe: Arc::clone(&probe) };
        let mut session = ReplayEngine::spawn(source, "delta", Duration::from_millis(1));

        next_block(&mut session).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        session.stop();
        session.stop();
        assert!(session.try_next_event().is_none());

        timeout(WAIT, async {
            while Arc::strong_count(&probe) > 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("engine task should drop its source after stop");
    }

    #[tokio::test]
    async fn replays_mission_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.mission");
        std::fs::write(&path, "1,1234\n2,3,00000000\n2,4,01000000\n").unwrap();

        let mut session = ReplaySession::open(&path, "flight", Duration::from_millis(1)).await.unwrap();
        assert_eq!(session.epoch(), 1234);
        assert_eq!(next_block(&mut session).await.block_subtype, 3);
        assert_eq!(next_block(&mut session).await.block_subtype, 4);
        assert_eq!(timeout(WAIT, session.next_event()).await.unwrap(), Some(ReplayEvent::Finished));
    }

    #[tokio::test]
    async fn missing_log_is_mission_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            ReplaySession::open(dir.path().join("nope.mission"), "nope", Duration::from_millis(1)).await;
        assert!(matches!(result, Err(TelemetryError::ReplayMissionNotFound { name }) if name == "nope"));
    }

    #[test]
    fn pacing_scales_with_speed() {
        let base = Duration::from_millis(100);
        assert_eq!(pacing_delay(base, 1.0), Some(base));
        assert_eq!(pacing_delay(base, 2.0), Some(Duration::from_millis(50)));
        assert_eq!(pacing_delay(base, 0.0), None);
        assert_eq!(pacing_delay(base, f64::NAN), None);
        assert_eq!(pacing_delay(base, f64::INFINITY), Some(Duration::ZERO));
    }
}
