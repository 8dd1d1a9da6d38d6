//! Per-client fuel level streaming loop.
//!
//! A session samples the guarded channel, pushes one [`Reading`] per
//! interval and stops when its cancellation token fires or the receiving
//! side goes away. Cancellation is only observed between samples; a read
//! that has started always completes.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::devices::{ScalarChannel, SensorError};
use crate::service::guard::AccessGuard;
use crate::service::response::{Reading, ResponseBuilder};

/// Lifecycle of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Active,
    TerminatedByClient,
    TerminatedByError,
}

/// Why a session stopped without a sensor fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The cancellation token fired.
    Cancelled,
    /// A push failed because the receiver was dropped.
    Disconnected,
}

/// Outcome of a session that ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    /// Readings successfully pushed.
    pub samples: u64,
}

/// Interval actually used for a requested one; zero means one unit.
pub fn effective_interval(requested_units: u32) -> u32 {
    requested_units.max(1)
}

pub struct StreamingSession<S> {
    label: String,
    guard: Arc<AccessGuard<S>>,
    interval_units: u32,
    interval: Duration,
    cancel: CancellationToken,
    state: SessionState,
    samples: u64,
}

impl<S: ScalarChannel> StreamingSession<S> {
    /// Creates a session in the `Starting` state.
    ///
    /// # Arguments
    ///
    /// * `label` - Identifies the session in log lines
    /// * `guard` - Channel to sample
    /// * `requested_units` - Requested interval; `0` is treated as `1`
    /// * `unit` - Wall-clock length of one interval unit
    /// * `cancel` - Token observed between samples
    pub fn new(
        label: impl Into<String>,
        guard: Arc<AccessGuard<S>>,
        requested_units: u32,
        unit: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let label = label.into();
        let interval_units = effective_interval(requested_units);
        if requested_units == 0 {
            warn!("[{label}] stream interval was 0, defaulting to 1");
        }

        Self {
            label,
            guard,
            interval_units,
            interval: unit.saturating_mul(interval_units),
            cancel,
            state: SessionState::Starting,
            samples: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn interval_units(&self) -> u32 {
        self.interval_units
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Runs the sampling loop until cancelled, disconnected or faulted.
    ///
    /// A failed push is a normal end (`SessionEnd::Disconnected`). A sensor
    /// fault is pushed to the client as an error reading and then returned.
    ///
    /// # Errors
    ///
    /// Returns the `SensorError` raised by the guarded read.
    pub async fn run(&mut self, tx: &mpsc::Sender<Reading>) -> Result<SessionSummary, SensorError> {
        self.state = SessionState::Active;
        info!(
            "[{}] starting {} stream every {} unit(s) ({:?})",
            self.label,
            self.guard.name(),
            self.interval_units,
            self.interval
        );

        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.finish(SessionEnd::Cancelled));
            }

            let result = self.guard.with(|s| s.read());
            let reading = ResponseBuilder::from_result(&result);

            let pushed = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(self.finish(SessionEnd::Cancelled)),
                sent = tx.send(reading) => sent.is_ok(),
            };
            if !pushed {
                return Ok(self.finish(SessionEnd::Disconnected));
            }
            self.samples += 1;

            match result {
                Ok(level) => debug!("[{}] streamed fuel level {level:.2}%", self.label),
                Err(err) => {
                    error!("[{}] fuel level read failed: {err}", self.label);
                    self.state = SessionState::TerminatedByError;
                    return Err(err);
                }
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {}
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn finish(&mut self, end: SessionEnd) -> SessionSummary {
        match end {
            SessionEnd::Cancelled => {
                self.state = SessionState::TerminatedByClient;
                info!(
                    "[{}] stream cancelled after {} sample(s)",
                    self.label, self.samples
                );
            }
            SessionEnd::Disconnected => {
                self.state = SessionState::TerminatedByError;
                info!(
                    "[{}] client disconnected from fuel level stream after {} sample(s)",
                    self.label, self.samples
                );
            }
        }
        SessionSummary {
            end,
            samples: self.samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::devices::ScalarSensor;
    use crate::service::response::Status;

    const UNIT: Duration = Duration::from_millis(20);

    fn fuel_guard() -> Arc<AccessGuard<ScalarSensor>> {
        Arc::new(AccessGuard::new(
            "fuel",
            ScalarSensor::new(80.0, 0.1, Some(7)).unwrap(),
        ))
    }

    struct BrokenSensor;

    impl ScalarChannel for BrokenSensor {
        fn read(&mut self) -> Result<f32, SensorError> {
            Err(SensorError::Fault("float switch stuck".into()))
        }

        fn refuel(&mut self, _amount: f32) -> Result<f32, SensorError> {
            Err(SensorError::Fault("float switch stuck".into()))
        }

        fn level(&self) -> f32 {
            0.0
        }

        fn channel_type(&self) -> &'static str {
            "BrokenSensor"
        }
    }

    #[test]
    fn zero_interval_behaves_like_one() {
        let zero = StreamingSession::new("a", fuel_guard(), 0, UNIT, CancellationToken::new());
        let one = StreamingSession::new("b", fuel_guard(), 1, UNIT, CancellationToken::new());
        assert_eq!(zero.interval_units(), 1);
        assert_eq!(zero.interval(), one.interval());
        assert_eq!(zero.state(), SessionState::Starting);
    }

    #[test]
    fn interval_scales_with_units() {
        let session = StreamingSession::new("a", fuel_guard(), 3, UNIT, CancellationToken::new());
        assert_eq!(session.interval(), UNIT * 3);
    }

    #[tokio::test]
    async fn cancellation_ends_cleanly_within_one_interval() {
        let cancel = CancellationToken::new();
        let mut session =
            StreamingSession::new("cancel", fuel_guard(), 5, UNIT, cancel.clone());
        let (tx, mut rx) = mpsc::channel(4);

        let task = tokio::spawn(async move {
            let out = session.run(&tx).await;
            (out, session.state())
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, Status::Ok);

        let started = Instant::now();
        cancel.cancel();
        let (out, state) = tokio::time::timeout(UNIT * 5, task)
            .await
            .expect("session should stop within one interval")
            .unwrap();
        assert!(started.elapsed() <= UNIT * 5);

        let summary = out.unwrap();
        assert_eq!(summary.end, SessionEnd::Cancelled);
        assert_eq!(summary.samples, 1);
        assert_eq!(state, SessionState::TerminatedByClient);
    }

    #[tokio::test]
    async fn already_cancelled_session_pushes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut session = StreamingSession::new("pre", fuel_guard(), 1, UNIT, cancel);
        let (tx, mut rx) = mpsc::channel(4);

        let summary = session.run(&tx).await.unwrap();
        drop(tx);
        assert_eq!(summary.samples, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_receiver_is_a_clean_exit() {
        let guard = fuel_guard();
        let mut session = StreamingSession::new(
            "gone",
            Arc::clone(&guard),
            1,
            UNIT,
            CancellationToken::new(),
        );
        let (tx, mut rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            let out = session.run(&tx).await;
            (out, session.state())
        });
        rx.recv().await.unwrap();
        drop(rx);

        let (out, state) = tokio::time::timeout(UNIT * 10, task).await.unwrap().unwrap();
        let summary = out.unwrap();
        assert_eq!(summary.end, SessionEnd::Disconnected);
        assert_eq!(state, SessionState::TerminatedByError);
        assert!(summary.samples >= 1);
    }

    #[tokio::test]
    async fn stream_decays_the_shared_sensor() {
        let guard = fuel_guard();
        let cancel = CancellationToken::new();
        let mut session = StreamingSession::new(
            "decay",
            Arc::clone(&guard),
            1,
            Duration::from_millis(1),
            cancel.clone(),
        );
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(async move { session.run(&tx).await });

        for _ in 0..5 {
            let reading = rx.recv().await.unwrap();
            assert!((0.0..=100.0).contains(&reading.level_percent));
        }
        cancel.cancel();
        let summary = task.await.unwrap().unwrap();

        let reads = guard.with(|s| Ok(s.sample_count())).unwrap();
        assert!(reads >= 5);
        assert!(summary.samples >= 5);
        let level = guard.with(|s| Ok(s.level())).unwrap();
        assert!((level - (80.0 - 0.1 * reads as f32)).abs() < 1e-3);
    }

    #[tokio::test]
    async fn sensor_fault_pushes_error_reading_then_fails() {
        let guard = Arc::new(AccessGuard::new("broken", BrokenSensor));
        let mut session =
            StreamingSession::new("fault", guard, 1, UNIT, CancellationToken::new());
        let (tx, mut rx) = mpsc::channel(4);

        let err = session.run(&tx).await.unwrap_err();
        assert!(matches!(err, SensorError::Fault(_)));
        assert_eq!(session.state(), SessionState::TerminatedByError);
        assert_eq!(session.samples(), 1);

        let reading = rx.recv().await.unwrap();
        assert_eq!(reading.status, Status::Error);
        assert!(reading.error_message.unwrap().contains("float switch stuck"));
    }
}
