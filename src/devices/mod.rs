//! Simulated vehicle sensor and actuator channels.

/// Binary on/off actuator (headlight).
pub mod digital;
/// Decaying, noisy scalar sensor (fuel level).
pub mod scalar;
pub mod types;

// Re-export the main types for convenience
pub use digital::DigitalActuator;
pub use scalar::ScalarSensor;
pub use types::BinaryChannel;
pub use types::ScalarChannel;
pub use types::SensorError;
