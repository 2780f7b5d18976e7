//! Protocol commands
//!
//! Defines the commands a GroPoint probe understands.

use serde::{Deserialize, Serialize};

/// Commands sent to the probe, without address prefix or `!` terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Ask whoever is on the bus for its address (`?`)
    AddressQuery,

    /// Send identification (`I`)
    Identify,

    /// Start a measurement (`M` or `M1`..`M9`)
    StartMeasurement {
        /// Measurement set, `None` for the primary `M`
        index: Option<u8>,
    },

    /// Send data buffer `n` (`D0`..`D9`)
    SendData {
        /// Data buffer number
        index: u8,
    },
}

impl Command {
    /// ASCII body of the command as it appears on the wire
    pub fn body(&self) -> String {
        match self {
            Command::AddressQuery => "?".to_string(),
            Command::Identify => "I".to_string(),
            Command::StartMeasurement { index: None } => "M".to_string(),
            Command::StartMeasurement { index: Some(n) } => format!("M{}", n),
            Command::SendData { index } => format!("D{}", index),
        }
    }

    /// Whether the command goes out prefixed with the probe address.
    /// Only the address query is broadcast.
    pub fn is_addressed(&self) -> bool {
        !matches!(self, Command::AddressQuery)
    }
}

/// Which set of sensors a measurement reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Soil moisture, one value per segment (`M`)
    Moisture,
    /// Soil temperature, one value per thermistor (`M1`)
    Temperature,
}

impl MeasurementKind {
    /// Command that starts this measurement
    pub fn start_command(&self) -> Command {
        match self {
            MeasurementKind::Moisture => Command::StartMeasurement { index: None },
            MeasurementKind::Temperature => Command::StartMeasurement { index: Some(1) },
        }
    }

    /// Command that fetches the values once the wait window has passed
    pub fn collect_command(&self) -> Command {
        Command::SendData { index: 0 }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementKind::Moisture => write!(f, "moisture"),
            MeasurementKind::Temperature => write!(f, "temperature"),
        }
    }
}
