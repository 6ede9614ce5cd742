//! Request and response bodies of the feeder's HTTP API.

use serde::{Deserialize, Serialize};

use super::DeviceError;

/// `GET /api/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerStatus {
    pub fn is_online(&self) -> bool {
        self.status == "ok"
    }
}

/// `POST /api/schedule`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchedule {
    /// 24h clock time, `HH:MM`
    pub time: String,
    pub amount: u32,
}

impl NewSchedule {
    pub fn new(time: impl Into<String>, amount: u32) -> Result<Self, DeviceError> {
        let time = time.into();
        if !is_clock_time(&time) {
            return Err(DeviceError::InvalidRequest(format!(
                "feed time must be HH:MM, got '{}'",
                time
            )));
        }
        Ok(Self { time, amount })
    }
}

fn is_clock_time(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    matches!((h.parse::<u8>(), m.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}

/// `POST /api/quantity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// Body of the calibration adjust endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Increment {
    pub increment: i32,
}

/// Servo calibration stored on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    /// PWM duty value
    pub duty_cycle: u32,
    /// Pulse length in milliseconds
    pub pulse_duration: u32,
}

/// Response of the calibration adjust/save endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub calibration: Calibration,
}

/// `POST /api/feed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub status: String,
    /// Feeds remaining after this one
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic `{"status": "...", "message": "..."}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
