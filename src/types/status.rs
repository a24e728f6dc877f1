//! Enumerations carried inside decoded data blocks

use serde::Serialize;

/// Health of one rocket subsystem as reported in a status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    /// Subsystem not fitted or never reported.
    #[default]
    None,
    Initializing,
    Active,
    Fault,
    Unknown(u8),
}

impl SensorStatus {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => SensorStatus::None,
            1 => SensorStatus::Initializing,
            2 => SensorStatus::Active,
            3 => SensorStatus::Fault,
            other => SensorStatus::Unknown(other),
        }
    }
}

/// Flight phase of the recovery/deployment controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    #[default]
    Idle,
    Armed,
    PoweredAscent,
    CoastingAscent,
    DrogueDeploy,
    DrogueDescent,
    MainDeploy,
    MainDescent,
    Recovery,
    Unknown(u8),
}

impl DeploymentState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => DeploymentState::Idle,
            1 => DeploymentState::Armed,
            2 => DeploymentState::PoweredAscent,
            3 => DeploymentState::CoastingAscent,
            4 => DeploymentState::DrogueDeploy,
            5 => DeploymentState::DrogueDescent,
            6 => DeploymentState::MainDeploy,
            7 => DeploymentState::MainDescent,
            8 => DeploymentState::Recovery,
            other => DeploymentState::Unknown(other),
        }
    }
}

/// GNSS position fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    Unknown,
    NotAvailable,
    Fix2d,
    Fix3d,
}

impl FixType {
    /// Map the low two bits of the fix byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0x03 {
            1 => FixType::NotAvailable,
            2 => FixType::Fix2d,
            3 => FixType::Fix3d,
            _ => FixType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constellation {
    Gps,
    Glonass,
}

/// One satellite in view, from a GNSS metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SatelliteInfo {
    pub elevation: u8,
    pub snr: u8,
    pub id: u8,
    pub constellation: Constellation,
    pub azimuth: u16,
}

impl SatelliteInfo {
    /// Unpack a 32-bit satellite word.
    pub fn from_word(word: u32) -> Self {
        Self {
            elevation: (word & 0xFF) as u8,
            snr: ((word >> 8) & 0xFF) as u8,
            id: ((word >> 16) & 0x1F) as u8,
            constellation: if (word >> 21) & 0x1 == 1 {
                Constellation::Glonass
            } else {
                Constellation::Gps
            },
            azimuth: ((word >> 22) & 0x1FF) as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(SensorStatus::from_raw(9), SensorStatus::Unknown(9));
        assert_eq!(DeploymentState::from_raw(200), DeploymentState::Unknown(200));
        assert_eq!(DeploymentState::from_raw(2), DeploymentState::PoweredAscent);
    }

    #[test]
    fn satellite_word_unpacks() {
        let word = 45 | (38 << 8) | (17 << 16) | (1 << 21) | (270 << 22);
        let sat = SatelliteInfo::from_word(word);
        assert_eq!(sat.elevation, 45);
        assert_eq!(sat.snr, 38);
        assert_eq!(sat.id, 17);
        assert_eq!(sat.constellation, Constellation::Glonass);
        assert_eq!(sat.azimuth, 270);
    }

    #[test]
    fn fix_type_uses_low_bits() {
        assert_eq!(FixType::from_raw(0b1111_0011), FixType::Fix3d);
        assert_eq!(FixType::from_raw(0), FixType::Unknown);
    }
}
