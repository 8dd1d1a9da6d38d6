//! Common types and traits for simulated sensor and actuator channels.

use thiserror::Error;

/// Lower bound of a scalar channel reading, in percent.
pub const LEVEL_MIN: f32 = 0.0;
/// Upper bound of a scalar channel reading, in percent.
pub const LEVEL_MAX: f32 = 100.0;

/// Failure reported by a sensor or actuator call.
///
/// `InvalidArgument` is a construction-time validation failure the caller
/// must correct. The other variants are transient faults raised while a
/// guarded call is in progress; handlers downgrade them to error responses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("sensor unavailable: {0}")]
    Unavailable(String),

    #[error("sensor fault: {0}")]
    Fault(String),
}

/// A scalar measurement channel that decays on every read.
///
/// Implementors are always accessed through an
/// [`AccessGuard`](crate::service::guard::AccessGuard), so methods take
/// `&mut self` and need no internal locking.
pub trait ScalarChannel {
    /// Applies one decay step and returns a noisy reading in
    /// `[LEVEL_MIN, LEVEL_MAX]`.
    fn read(&mut self) -> Result<f32, SensorError>;

    /// Adds `amount` to the stored value and returns the new stored value.
    ///
    /// Negative amounts are ignored and the current value is returned.
    fn refuel(&mut self, amount: f32) -> Result<f32, SensorError>;

    /// Current stored (pre-noise) value.
    fn level(&self) -> f32;

    /// Returns a human-readable type name for the channel.
    fn channel_type(&self) -> &'static str;
}

/// A binary on/off channel.
pub trait BinaryChannel {
    /// Sets the state and returns whether the operation succeeded.
    fn set(&mut self, state: bool) -> Result<bool, SensorError>;

    /// Returns the current state.
    fn get(&self) -> bool;
}

/// Clamps `value` into the valid reading range.
pub fn clamp_level(value: f32) -> f32 {
    value.clamp(LEVEL_MIN, LEVEL_MAX)
}
