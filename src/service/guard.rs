//! Exclusive access to one sensor or actuator instance.

use std::sync::Mutex;

use crate::devices::SensorError;

/// Serializes every operation on a single channel instance.
///
/// The lock is held only while the closure passed to [`AccessGuard::with`]
/// runs. It is a synchronous mutex and must never be held across an
/// `.await`; callers build responses and push to the network after the
/// closure returns.
#[derive(Debug)]
pub struct AccessGuard<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> AccessGuard<T> {
    /// Wraps `channel` under a guard labelled `name` for diagnostics.
    pub fn new(name: &'static str, channel: T) -> Self {
        Self {
            name,
            inner: Mutex::new(channel),
        }
    }

    /// Label used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs `op` with exclusive access to the channel.
    ///
    /// # Errors
    ///
    /// Returns whatever `op` returns, or `SensorError::Unavailable` if a
    /// previous holder panicked and left the channel in an unknown state.
    pub fn with<R>(
        &self,
        op: impl FnOnce(&mut T) -> Result<R, SensorError>,
    ) -> Result<R, SensorError> {
        let mut channel = self.inner.lock().map_err(|_| {
            log::error!("{} guard poisoned by a panicked holder", self.name);
            SensorError::Unavailable(format!("{} is in an unknown state", self.name))
        })?;
        op(&mut channel)
    }
}
