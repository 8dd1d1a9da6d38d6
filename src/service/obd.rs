//! Fuel level service: unary reads, refuelling and streaming sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::Stream;
use futures_util::stream;
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::{FuelConfig, StreamConfig};
use crate::devices::{ScalarChannel, ScalarSensor, SensorError};
use crate::service::guard::AccessGuard;
use crate::service::response::{Reading, ResponseBuilder};
use crate::service::stream::{SessionSummary, StreamingSession};

/// Readings buffered between a session and its client.
const STREAM_BUFFER: usize = 4;

/// A guarded call failed; carries the error reading to send back.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CallFailure {
    pub reading: Reading,
    #[source]
    pub error: SensorError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("maximum concurrent streams reached ({0})")]
    Busy(usize),
}

/// Owns the fuel level channel and serves every call against it.
///
/// Streaming sessions each run on their own task and hold one of
/// `max_sessions` permits for their whole lifetime.
pub struct ObdService<S = ScalarSensor> {
    fuel: Arc<AccessGuard<S>>,
    stream_unit: Duration,
    max_sessions: usize,
    stream_slots: Arc<Semaphore>,
    shutdown: CancellationToken,
    next_session: AtomicU64,
}

impl ObdService<ScalarSensor> {
    /// Builds the service around a [`ScalarSensor`] configured from `fuel`.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidArgument` if the sensor rejects the
    /// configured decay rate or initial level.
    pub fn new(
        fuel: &FuelConfig,
        stream: &StreamConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, SensorError> {
        let sensor = ScalarSensor::new(fuel.initial_level, fuel.decay_rate, fuel.seed)?;
        info!(
            "initializing OBD service with fuel level {:.1}% (decay {} per read)",
            sensor.level(),
            sensor.decay_rate()
        );
        Ok(Self::with_channel(
            sensor,
            Duration::from_millis(stream.interval_unit_ms),
            stream.max_sessions,
            shutdown,
        ))
    }
}

impl<S: ScalarChannel> ObdService<S> {
    /// Builds the service around any scalar channel.
    ///
    /// `max_sessions` is capped at the largest permit count the session
    /// semaphore supports.
    pub fn with_channel(
        channel: S,
        stream_unit: Duration,
        max_sessions: usize,
        shutdown: CancellationToken,
    ) -> Self {
        let max_sessions = max_sessions.min(Semaphore::MAX_PERMITS);
        debug!(
            "fuel level channel {} allows {max_sessions} concurrent stream(s)",
            channel.channel_type()
        );
        Self {
            fuel: Arc::new(AccessGuard::new("fuel_level", channel)),
            stream_unit,
            max_sessions,
            stream_slots: Arc::new(Semaphore::new(max_sessions)),
            shutdown,
            next_session: AtomicU64::new(1),
        }
    }

    /// Reads the fuel level once, applying one decay step.
    ///
    /// # Errors
    ///
    /// Returns a `CallFailure` holding an error reading if the sensor faults.
    pub fn get_fuel_level(&self, vehicle_id: &str) -> Result<Reading, CallFailure> {
        debug!("received GetFuelLevel request for {vehicle_id}");
        let result = self.fuel.with(|s| s.read());
        let reading = ResponseBuilder::from_result(&result);

        match result {
            Ok(level) => {
                info!("fuel level read for {vehicle_id}: {level:.2}%");
                Ok(reading)
            }
            Err(error) => {
                error!("error reading fuel level for {vehicle_id}: {error}");
                Err(CallFailure { reading, error })
            }
        }
    }

    /// Adds fuel and returns a reading of the new stored level.
    ///
    /// Negative amounts leave the level unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `CallFailure` holding an error reading if the sensor faults.
    pub fn refuel(&self, amount: f32) -> Result<Reading, CallFailure> {
        debug!("received Refuel request: {amount}");
        if amount < 0.0 {
            warn!("ignoring negative refuel amount {amount}");
        }
        let result = self.fuel.with(|s| s.refuel(amount));
        let reading = ResponseBuilder::from_result(&result);

        match result {
            Ok(level) => {
                info!("refuelled by {amount}, level now {level:.2}%");
                Ok(reading)
            }
            Err(error) => {
                error!("error refuelling: {error}");
                Err(CallFailure { reading, error })
            }
        }
    }

    /// Stored (pre-noise) level, without applying decay.
    pub fn level(&self) -> Result<f32, SensorError> {
        self.fuel.with(|s| Ok(s.level()))
    }

    /// Number of streaming sessions currently running.
    pub fn active_streams(&self) -> usize {
        self.max_sessions - self.stream_slots.available_permits()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl<S: ScalarChannel + Send + 'static> ObdService<S> {
    /// Starts a streaming session on its own task.
    ///
    /// Must be called from within a tokio runtime. The session ends when the
    /// returned handle is dropped or finished, when the service shuts down,
    /// or when the sensor faults.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Busy` when all session permits are taken.
    pub fn stream_fuel_level(
        &self,
        vehicle_id: &str,
        interval_seconds: u32,
    ) -> Result<StreamHandle, StreamError> {
        let permit = Arc::clone(&self.stream_slots)
            .try_acquire_owned()
            .map_err(|_| {
                warn!(
                    "rejecting fuel level stream for {vehicle_id}: {} sessions active",
                    self.max_sessions
                );
                StreamError::Busy(self.max_sessions)
            })?;

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut session = StreamingSession::new(
            format!("stream-{id} {vehicle_id}"),
            Arc::clone(&self.fuel),
            interval_seconds,
            self.stream_unit,
            token.clone(),
        );

        let task = tokio::spawn(async move {
            let _permit = permit;
            session.run(&tx).await
        });

        Ok(StreamHandle {
            rx,
            task,
            token: token.clone(),
            _cancel_on_drop: token.drop_guard(),
        })
    }
}

/// Client side of a streaming session.
///
/// Dropping the handle cancels the session.
pub struct StreamHandle {
    rx: mpsc::Receiver<Reading>,
    task: JoinHandle<Result<SessionSummary, SensorError>>,
    token: CancellationToken,
    _cancel_on_drop: DropGuard,
}

impl StreamHandle {
    /// Waits for the next reading; `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<Reading> {
        self.rx.recv().await
    }

    /// Asks the session to stop without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    async fn join(&mut self) -> Result<SessionSummary, SensorError> {
        (&mut self.task)
            .await
            .map_err(|e| SensorError::Fault(format!("stream task failed: {e}")))?
    }

    /// Cancels the session and waits for it to stop.
    ///
    /// # Errors
    ///
    /// Returns the sensor fault that ended the session, if any.
    pub async fn finish(mut self) -> Result<SessionSummary, SensorError> {
        self.cancel();
        self.join().await
    }

    /// Converts the handle into a stream of readings.
    ///
    /// Once the session stops pushing, the stream yields the sensor fault
    /// that ended it, if any, as its final item.
    pub fn into_stream(self) -> impl Stream<Item = Result<Reading, SensorError>> + Send {
        stream::unfold(Some(self), |state| async move {
            let Some(mut handle) = state else {
                return None;
            };
            match handle.recv().await {
                Some(reading) => Some((Ok(reading), Some(handle))),
                None => handle.join().await.err().map(|e| (Err(e), None)),
            }
        })
    }
}
