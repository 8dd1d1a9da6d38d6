//! Timestamped reading records returned by every fuel level call.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::devices::SensorError;

/// Payload status code: `0` for success, `1` for error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Status {
    Ok,
    Error,
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// One immutable fuel level sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Sampled level in percent.
    pub level_percent: f32,
    /// Wall-clock time the sample completed, in Unix milliseconds.
    pub timestamp_ms: i64,
    /// `0` = OK, `1` = error.
    pub status: Status,
    /// Fault description, present only when `status` is `1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Reading {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Builds [`Reading`]s stamped with the current time.
///
/// Call it right after the guarded section releases so the timestamp
/// reflects sample completion rather than request arrival.
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// A successful reading of `level`.
    pub fn success(level: f32) -> Reading {
        Reading {
            level_percent: level,
            timestamp_ms: now_millis(),
            status: Status::Ok,
            error_message: None,
        }
    }

    /// An error reading carrying the fault text.
    pub fn failure(err: &SensorError) -> Reading {
        Reading {
            level_percent: 0.0,
            timestamp_ms: now_millis(),
            status: Status::Error,
            error_message: Some(err.to_string()),
        }
    }

    pub fn from_result(result: &Result<f32, SensorError>) -> Reading {
        match result {
            Ok(level) => Self::success(*level),
            Err(err) => Self::failure(err),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
