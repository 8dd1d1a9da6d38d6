//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;

use super::AppState;
use super::types::{
    ErrorResponse, FuelLevelQuery, HeadlightStateResponse, HealthResponse, RefuelRequest,
    RefuelResponse, SetHeadlightRequest, SetHeadlightResponse, StreamQuery,
};
use crate::devices::ScalarChannel;

/// Reads the fuel level once.
///
/// `GET /fuel` → 200 + `Reading` JSON
/// `GET /fuel` on sensor fault → 500 + `Reading` JSON with `status: 1`
pub async fn get_fuel_level<S: ScalarChannel + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<FuelLevelQuery>,
) -> Response {
    let vehicle_id = query.vehicle_id.as_deref().unwrap_or(&state.vehicle_id);
    match state.obd.get_fuel_level(vehicle_id) {
        Ok(reading) => Json(reading).into_response(),
        Err(failure) => (StatusCode::INTERNAL_SERVER_ERROR, Json(failure.reading)).into_response(),
    }
}

/// Streams fuel level readings as server-sent events.
///
/// `GET /fuel/stream?interval_seconds=N` → 200 + `text/event-stream`, one
/// `fuel_level` event per interval until the client goes away; a sensor
/// fault ends the stream with an `error` event carrying the fault text
/// `GET /fuel/stream` with every session slot taken → 503 + `ErrorResponse`
pub async fn stream_fuel_level<S: ScalarChannel + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let vehicle_id = query.vehicle_id.as_deref().unwrap_or(&state.vehicle_id);
    let interval = query.interval_seconds.unwrap_or(0);

    let handle = match state.obd.stream_fuel_level(vehicle_id, interval) {
        Ok(handle) => handle,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let events = handle.into_stream().map(|item| match item {
        Ok(reading) => Event::default().event("fuel_level").json_data(reading),
        Err(e) => Ok(Event::default().event("error").data(e.to_string())),
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Adds fuel.
///
/// `POST /fuel/refuel` `{"amount": f32}` → 200 + `RefuelResponse` JSON
pub async fn refuel<S: ScalarChannel + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<RefuelRequest>,
) -> Response {
    match state.obd.refuel(request.amount) {
        Ok(reading) => Json(RefuelResponse::from(&reading)).into_response(),
        Err(failure) => (StatusCode::INTERNAL_SERVER_ERROR, Json(failure.reading)).into_response(),
    }
}

/// `GET /headlight` → 200 + `{"is_on": bool}`
pub async fn get_headlight_state<S: ScalarChannel + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Response {
    match state.lighting.get_headlight_state() {
        Ok(is_on) => Json(HeadlightStateResponse { is_on }).into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}

/// `POST /headlight` `{"turn_on": bool}` → 200 + `{"success": bool}`
pub async fn set_headlight<S: ScalarChannel + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<SetHeadlightRequest>,
) -> Response {
    match state.lighting.set_headlight(request.turn_on) {
        Ok(success) => Json(SetHeadlightResponse { success }).into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}

/// `GET /health` → 200 + `{"status": "SERVING"}`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "SERVING" })
}

fn internal_error(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
        .into_response()
}
