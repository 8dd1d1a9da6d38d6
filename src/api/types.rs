//! API request and response types.
//!
//! Fuel level calls answer with [`Reading`](crate::service::Reading)
//! directly; the types here cover query strings, the headlight calls and
//! refuelling.

use serde::{Deserialize, Serialize};

use crate::service::Reading;

/// Query parameters for `GET /fuel`.
#[derive(Debug, Deserialize)]
pub struct FuelLevelQuery {
    /// Vehicle to read; defaults to the configured vehicle.
    pub vehicle_id: Option<String>,
}

/// Query parameters for `GET /fuel/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Vehicle to read; defaults to the configured vehicle.
    pub vehicle_id: Option<String>,
    /// Seconds between readings; missing or `0` means 1.
    pub interval_seconds: Option<u32>,
}

/// Body of `POST /fuel/refuel`.
#[derive(Debug, Deserialize, Serialize)]
pub struct RefuelRequest {
    /// Percentage points to add; negative amounts are ignored.
    pub amount: f32,
}

#[derive(Debug, Serialize)]
pub struct RefuelResponse {
    /// Stored level after refuelling, without noise.
    pub level_percent: f32,
    pub timestamp_ms: i64,
}

impl From<&Reading> for RefuelResponse {
    fn from(r: &Reading) -> Self {
        Self {
            level_percent: r.level_percent,
            timestamp_ms: r.timestamp_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeadlightStateResponse {
    pub is_on: bool,
}

/// Body of `POST /headlight`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SetHeadlightRequest {
    pub turn_on: bool,
}

#[derive(Debug, Serialize)]
pub struct SetHeadlightResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response body for calls that fail without a reading.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
