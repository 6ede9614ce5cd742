//! Typed access to the feeder firmware's HTTP API.
//!
//! Mirrors what the control panel does from the browser: poll status,
//! manage schedules, trigger a feed, set the food quantity and tune the
//! servo calibration.

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::DeviceClient;
pub use types::{
    Ack, Calibration, CalibrationUpdate, FeedResponse, Increment, NewSchedule, QuantityUpdate,
    ServerStatus,
};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Invalid device url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Device returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}
