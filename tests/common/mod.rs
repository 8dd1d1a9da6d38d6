//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::response::Response;
use tokio_util::sync::CancellationToken;

use zonal_sim::api::AppState;
use zonal_sim::config::AppConfig;
use zonal_sim::devices::{ScalarChannel, ScalarSensor, SensorError};

/// Default test configuration: seeded noise, 10 ms interval units, 2 stream slots.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.fuel.initial_level = 80.0;
    cfg.fuel.seed = Some(42);
    cfg.stream.interval_unit_ms = 10;
    cfg.stream.max_sessions = 2;
    cfg
}

/// Application state built from [`test_config`].
pub fn test_state(shutdown: CancellationToken) -> Arc<AppState> {
    Arc::new(AppState::from_config(&test_config(), shutdown).expect("test config is valid"))
}

/// Wraps a [`ScalarSensor`] and counts reads that reached the sensor.
pub struct CountingSensor {
    inner: ScalarSensor,
    reads: Arc<AtomicU64>,
}

impl CountingSensor {
    /// Returns the sensor and a handle to its read counter.
    pub fn new(initial: f32, decay_rate: f32) -> (Self, Arc<AtomicU64>) {
        let reads = Arc::new(AtomicU64::new(0));
        let sensor = Self {
            inner: ScalarSensor::new(initial, decay_rate, Some(7)).expect("valid sensor"),
            reads: Arc::clone(&reads),
        };
        (sensor, reads)
    }
}

impl ScalarChannel for CountingSensor {
    fn read(&mut self) -> Result<f32, SensorError> {
        let reading = self.inner.read()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(reading)
    }

    fn refuel(&mut self, amount: f32) -> Result<f32, SensorError> {
        self.inner.refuel(amount)
    }

    fn level(&self) -> f32 {
        self.inner.level()
    }

    fn channel_type(&self) -> &'static str {
        "CountingSensor"
    }
}

/// Decodes a JSON response body.
pub async fn body_json(resp: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&body).expect("body should be JSON")
}
