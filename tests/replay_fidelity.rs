//! Replay fidelity: a recorded mission replays to the same decoded blocks as live.

mod common;

use anyhow::{Context, Result, bail};
use groundstation::protocol::{DecodedBlock, Transmission};
use groundstation::replay::{ReplayEvent, ReplaySession};
use groundstation::{MissionRecorder, mission::append_block};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn recorded_mission_replays_block_for_block() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = tempfile::tempdir()?;
    let recorder = MissionRecorder::new(dir.path(), "mission");
    let record = recorder.create("fidelity", 1_718_035_200)?;

    let mut live = Vec::new();
    for hex in common::flight(12) {
        let transmission = Transmission::parse(&hex)?;
        for block in &transmission.blocks {
            append_block(&record.path, &block.to_triple())?;
        }
        live.extend(transmission.decode_blocks()?);
    }
    assert_eq!(live.len(), 36);

    let mut session = ReplaySession::open(&record.path, "fidelity", Duration::from_millis(1)).await?;
    assert_eq!(session.epoch(), 1_718_035_200);

    let mut replayed: Vec<DecodedBlock> = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(5), session.next_event())
            .await
            .context("replay stalled")?;
        match event {
            Some(ReplayEvent::Block(triple)) => replayed.push(triple.decode()?),
            Some(ReplayEvent::Finished) => break,
            None => bail!("replay ended without finishing"),
        }
    }
    session.stop();

    assert_eq!(replayed, live);
    Ok(())
}

#[tokio::test]
async fn speed_change_resumes_where_paused() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let recorder = MissionRecorder::new(dir.path(), "mission");
    let record = recorder.create("paced", 0)?;
    for hex in common::flight(4) {
        for block in Transmission::parse(&hex)?.blocks {
            append_block(&record.path, &block.to_triple())?;
        }
    }

    let mut session = ReplaySession::open(&record.path, "paced", Duration::from_millis(80)).await?;
    let first = timeout(Duration::from_secs(2), session.next_event()).await?;
    assert!(matches!(first, Some(ReplayEvent::Block(ref t)) if t.block_subtype == 1));

    session.set_speed(0.0);
    assert!(timeout(Duration::from_millis(250), session.next_event()).await.is_err());

    session.set_speed(2.0);
    let second = timeout(Duration::from_secs(2), session.next_event()).await?;
    // Block after the first STATUS is the first ALTITUDE, not a restart
    assert!(matches!(second, Some(ReplayEvent::Block(ref t)) if t.block_subtype == 3));
    session.stop();
    Ok(())
}
