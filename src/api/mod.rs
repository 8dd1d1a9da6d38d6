//! HTTP API for the fuel level and headlight services.
//!
//! Routes:
//! - `GET /fuel`: one fuel level reading
//! - `GET /fuel/stream`: server-sent fuel level readings
//! - `POST /fuel/refuel`: add fuel
//! - `GET /headlight`, `POST /headlight`: headlight state
//! - `GET /health`: liveness

mod handlers;
pub mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::devices::{ScalarChannel, ScalarSensor, SensorError};
use crate::service::{LightingService, ObdService};

/// Application state shared across all request handlers.
///
/// Each service owns its channel behind an access guard, so the state
/// itself is shared through a plain `Arc`.
pub struct AppState<S = ScalarSensor> {
    /// Fuel level service.
    pub obd: ObdService<S>,
    /// Headlight service.
    pub lighting: LightingService,
    /// Vehicle reported when a request names none.
    pub vehicle_id: String,
}

impl AppState<ScalarSensor> {
    /// Builds both services from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidArgument` if the fuel sensor parameters
    /// are rejected.
    pub fn from_config(cfg: &AppConfig, shutdown: CancellationToken) -> Result<Self, SensorError> {
        Ok(Self {
            obd: ObdService::new(&cfg.fuel, &cfg.stream, shutdown)?,
            lighting: LightingService::new(),
            vehicle_id: cfg.server.vehicle_id.clone(),
        })
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router<S: ScalarChannel + Send + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/fuel", get(handlers::get_fuel_level::<S>))
        .route("/fuel/stream", get(handlers::stream_fuel_level::<S>))
        .route("/fuel/refuel", post(handlers::refuel::<S>))
        .route(
            "/headlight",
            get(handlers::get_headlight_state::<S>).post(handlers::set_headlight::<S>),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Binds to the given address and serves the API until `shutdown` fires.
///
/// Streaming sessions are children of the same token, so cancelling it
/// also ends every open stream and lets the server drain.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve<S: ScalarChannel + Send + 'static>(
    state: Arc<AppState<S>>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("zonal controller listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
