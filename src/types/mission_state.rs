//! Mission state owned by the telemetry coordinator

use serde::Serialize;

/// Where the telemetry currently comes from.
///
/// Serialized as its integer code, which consumers of the snapshot key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "i8")]
pub enum MissionState {
    /// No radio connected and no replay running.
    #[default]
    Idle,
    /// Connected to a real radio.
    Live,
    /// Playing back a recorded mission.
    Replay,
    /// Connected to the radio emulator.
    Test,
}

impl MissionState {
    /// Port name the serial layer reports for the radio emulator.
    pub const TEST_PORT: &'static str = "test";

    pub fn code(self) -> i8 {
        match self {
            MissionState::Idle => -1,
            MissionState::Live => 0,
            MissionState::Replay => 1,
            MissionState::Test => 2,
        }
    }

    /// State implied by the serial layer's connected port (empty when disconnected).
    pub fn from_connected_port(port: Option<&str>) -> Self {
        match port {
            None | Some("") => MissionState::Idle,
            Some(MissionState::TEST_PORT) => MissionState::Test,
            Some(_) => MissionState::Live,
        }
    }
}

impl From<MissionState> for i8 {
    fn from(state: MissionState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for MissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MissionState::Idle => "idle",
            MissionState::Live => "live",
            MissionState::Replay => "replay",
            MissionState::Test => "test",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_port_selects_state() {
        assert_eq!(MissionState::from_connected_port(Some("test")), MissionState::Test);
        assert_eq!(MissionState::from_connected_port(Some("COM3")), MissionState::Live);
        assert_eq!(MissionState::from_connected_port(Some("")), MissionState::Idle);
        assert_eq!(MissionState::from_connected_port(None), MissionState::Idle);
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&MissionState::Idle).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&MissionState::Test).unwrap(), "2");
    }
}
