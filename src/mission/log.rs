//! Mission log format
//!
//! Plain UTF-8 text, one record per line:
//!
//! ```text
//! 1,1718035200            <recording_flag>,<epoch_unix_seconds>
//! 2,3,E803000065...       <block_type>,<block_subtype>,<payload_hex>
//! 2,1,F0030000020202...
//! ```
//!
//! The header line is written when the mission is created; block triples follow in
//! arrival order. Replay relies on this exact framing.

use crate::protocol::BlockTriple;
use crate::replay::TripleSource;
use crate::{Result, TelemetryError};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

/// First line of a mission log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionLogHeader {
    pub recording: bool,
    /// Creation time, Unix seconds.
    pub epoch: u64,
}

impl std::fmt::Display for MissionLogHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.recording as u8, self.epoch)
    }
}

impl FromStr for MissionLogHeader {
    type Err = TelemetryError;

    fn from_str(line: &str) -> Result<Self> {
        let (flag, epoch) = line
            .trim()
            .split_once(',')
            .ok_or_else(|| TelemetryError::mission_log(1, format!("invalid header {:?}", line)))?;

        let flag = flag.trim().parse::<i64>().map_err(|e| {
            TelemetryError::mission_log(1, format!("invalid recording flag {:?}: {}", flag, e))
        })?;
        let epoch = epoch.trim().parse::<u64>().map_err(|e| {
            TelemetryError::mission_log(1, format!("invalid epoch {:?}: {}", epoch, e))
        })?;

        Ok(Self { recording: flag != 0, epoch })
    }
}

/// Sequential reader over a mission log's block triples.
///
/// The file handle is owned by the reader and released when it is dropped.
pub struct MissionLogReader {
    path: PathBuf,
    header: MissionLogHeader,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl MissionLogReader {
    /// Open a mission log and read its header line.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await.map_err(|e| TelemetryError::file_error(&path, e))?;
        let mut lines = BufReader::new(file).lines();

        let first = lines
            .next_line()
            .await
            .map_err(|e| TelemetryError::file_error(&path, e))?
            .ok_or_else(|| TelemetryError::mission_log(1, "mission log is empty"))?;
        let header: MissionLogHeader = first.parse()?;

        debug!("Opened mission log {} (epoch {})", path.display(), header.epoch);

        Ok(Self { path, header, lines, line: 1 })
    }

    pub fn header(&self) -> MissionLogHeader {
        self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of the last line read, 1-based.
    pub fn line(&self) -> usize {
        self.line
    }
}

#[async_trait::async_trait]
impl TripleSource for MissionLogReader {
    async fn next_triple(&mut self) -> Result<Option<BlockTriple>> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .map_err(|e| TelemetryError::file_error(&self.path, e))?
            else {
                return Ok(None);
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }

            return line.parse::<BlockTriple>().map(Some).map_err(|err| match err {
                TelemetryError::MissionLog { details, .. } => {
                    TelemetryError::mission_log(self.line, details)
                }
                other => other,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_round_trips() {
        let header = MissionLogHeader { recording: true, epoch: 1_718_035_200 };
        assert_eq!(header.to_string(), "1,1718035200");
        assert_eq!("1,1718035200".parse::<MissionLogHeader>().unwrap(), header);
        assert!("nonsense".parse::<MissionLogHeader>().is_err());
    }

    #[tokio::test]
    async fn reads_triples_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.mission");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "1,1000").unwrap();
        writeln!(file, "2,3,E8030000").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "0,0,00000000").unwrap();
        drop(file);

        let mut reader = MissionLogReader::open(&path).await.unwrap();
        assert_eq!(reader.header().epoch, 1000);

        let first = reader.next_triple().await.unwrap().unwrap();
        assert_eq!((first.block_type, first.block_subtype), (2, 3));
        let second = reader.next_triple().await.unwrap().unwrap();
        assert_eq!(second.block_type, 0);
        assert!(reader.next_triple().await.unwrap().is_none());
        assert_eq!(reader.line(), 4);
    }

    #[tokio::test]
    async fn malformed_line_reports_its_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mission");
        std::fs::write(&path, "1,1000\n2,3,00000000\ngarbage\n").unwrap();

        let mut reader = MissionLogReader::open(&path).await.unwrap();
        assert!(reader.next_triple().await.unwrap().is_some());
        let err = reader.next_triple().await.unwrap_err();
        assert!(matches!(err, TelemetryError::MissionLog { line: 3, .. }));
    }

    #[tokio::test]
    async fn empty_log_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mission");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            MissionLogReader::open(&path).await,
            Err(TelemetryError::MissionLog { line: 1, .. })
        ));
    }
}
