//! Command surface of the coordinator
//!
//! Commands arrive from the control transport as word tuples, for example
//! `["telemetry", "replay", "speed", "2.5"]`. [`Command::parse`] turns them into typed
//! commands; anything that does not match a known shape is an `InvalidCommand`.

use crate::{Result, TelemetryError};
use std::fmt;

/// Operator command accepted by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `radio connect <port>`: forwarded to the serial collaborator.
    RadioConnect(String),
    /// `radio disconnect`: forwarded to the serial collaborator.
    RadioDisconnect,
    /// `telemetry update`: re-emit the current snapshot.
    Update,
    /// `telemetry record start [name]`
    RecordStart(Option<String>),
    /// `telemetry record stop`
    RecordStop,
    /// `telemetry replay play [mission]`. Without a mission, resumes the current replay.
    ReplayPlay(Option<String>),
    /// `telemetry replay pause`
    ReplayPause,
    /// `telemetry replay speed <multiplier>`
    ReplaySpeed(f64),
    /// `telemetry replay stop`
    ReplayStop,
}

impl Command {
    /// Parse a command tuple.
    ///
    /// ```rust
    /// use groundstation::coordinator::Command;
    ///
    /// let command = Command::parse(&["telemetry", "replay", "speed", "2"])?;
    /// assert_eq!(command, Command::ReplaySpeed(2.0));
    /// assert!(Command::parse(&["telemetry", "warp"]).is_err());
    /// # Ok::<(), groundstation::TelemetryError>(())
    /// ```
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();

        let command = match words.as_slice() {
            ["radio", "connect", port] => Command::RadioConnect(port.to_string()),
            ["radio", "disconnect"] => Command::RadioDisconnect,
            ["telemetry", "update"] => Command::Update,
            ["telemetry", "record", "start"] => Command::RecordStart(None),
            ["telemetry", "record", "start", name] => Command::RecordStart(Some(name.to_string())),
            ["telemetry", "record", "stop"] => Command::RecordStop,
            ["telemetry", "replay", "play"] => Command::ReplayPlay(None),
            ["telemetry", "replay", "play", mission] => {
                Command::ReplayPlay(Some(mission.to_string()))
            }
            ["telemetry", "replay", "pause"] => Command::ReplayPause,
            ["telemetry", "replay", "speed", speed] => {
                let speed = speed.parse::<f64>().map_err(|e| {
                    TelemetryError::invalid_command(format!("invalid replay speed {:?}: {}", speed, e))
                })?;
                Command::ReplaySpeed(speed)
            }
            ["telemetry", "replay", "stop"] => Command::ReplayStop,
            _ => {
                return Err(TelemetryError::invalid_command(format!(
                    "unrecognised command {:?}",
                    words.join(" ")
                )));
            }
        };

        Ok(command)
    }

    /// Parse a whitespace separated command line.
    pub fn parse_line(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        Self::parse(&words)
    }
}

/// Signal report query sent to the radio when a CONTROL block arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioRequest {
    GetSnr,
    GetRssi,
}

impl RadioRequest {
    /// Both signal report queries, in the order they are sent.
    pub const SIGNAL_REPORT: [RadioRequest; 2] = [RadioRequest::GetSnr, RadioRequest::GetRssi];
}

impl fmt::Display for RadioRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioRequest::GetSnr => write!(f, "radio get snr"),
            RadioRequest::GetRssi => write!(f, "radio get rssi"),
        }
    }
}

/// Message from the coordinator to the serial collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialCommand {
    Connect(String),
    Disconnect,
    Radio(RadioRequest),
}

/// Status report from the serial collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    /// Ports currently available for connection.
    Ports(Vec<String>),
    /// A radio (or the emulator on port `test`) is connected.
    Connected(String),
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_shape() {
        let cases: [(&[&str], Command); 11] = [
            (&["radio", "connect", "COM3"], Command::RadioConnect("COM3".into())),
            (&["radio", "disconnect"], Command::RadioDisconnect),
            (&["telemetry", "update"], Command::Update),
            (&["telemetry", "record", "start"], Command::RecordStart(None)),
            (&["telemetry", "record", "start", "alpha"], Command::RecordStart(Some("alpha".into()))),
            (&["telemetry", "record", "stop"], Command::RecordStop),
            (&["telemetry", "replay", "play"], Command::ReplayPlay(None)),
            (&["telemetry", "replay", "play", "flight"], Command::ReplayPlay(Some("flight".into()))),
            (&["telemetry", "replay", "pause"], Command::ReplayPause),
            (&["telemetry", "replay", "speed", "0.5"], Command::ReplaySpeed(0.5)),
            (&["telemetry", "replay", "stop"], Command::ReplayStop),
        ];

        for (words, expected) in cases {
            assert_eq!(Command::parse(words).unwrap(), expected, "{:?}", words);
        }
    }

    #[test]
    fn malformed_shapes_are_invalid_commands() {
        let bad: [&[&str]; 5] = [
            &[],
            &["telemetry"],
            &["telemetry", "replay", "speed"],
            &["telemetry", "replay", "speed", "fast"],
            &["radio", "connect"],
        ];

        for words in bad {
            let err = Command::parse(words).unwrap_err();
            assert!(matches!(err, TelemetryError::InvalidCommand { .. }), "{:?}", words);
        }
    }

    #[test]
    fn parse_line_splits_on_whitespace() {
        assert_eq!(Command::parse_line("  telemetry  replay stop ").unwrap(), Command::ReplayStop);
    }

    #[test]
    fn radio_requests_render_as_radio_commands() {
        let rendered: Vec<String> = RadioRequest::SIGNAL_REPORT.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["radio get snr", "radio get rssi"]);
    }
}
