//! Headlight control service.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::devices::{BinaryChannel, DigitalActuator, SensorError};
use crate::service::guard::AccessGuard;

/// Owns the headlight channel and serves get/set calls against it.
pub struct LightingService<A = DigitalActuator> {
    headlight: Arc<AccessGuard<A>>,
}

impl LightingService<DigitalActuator> {
    /// Creates the service with the headlight switched off.
    pub fn new() -> Self {
        info!("initializing lighting service");
        Self::with_channel(DigitalActuator::default())
    }
}

impl Default for LightingService<DigitalActuator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: BinaryChannel> LightingService<A> {
    pub fn with_channel(channel: A) -> Self {
        Self {
            headlight: Arc::new(AccessGuard::new("headlight", channel)),
        }
    }

    /// Current headlight state.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Unavailable` if the guard is poisoned.
    pub fn get_headlight_state(&self) -> Result<bool, SensorError> {
        debug!("received GetHeadlightState request");
        let state = self.headlight.with(|h| Ok(h.get())).inspect_err(|e| {
            error!("error getting headlight state: {e}");
        })?;
        info!("headlight state: {}", on_off(state));
        Ok(state)
    }

    /// Switches the headlight and reports whether the actuator accepted it.
    ///
    /// # Errors
    ///
    /// Returns the actuator's `SensorError` on fault.
    pub fn set_headlight(&self, turn_on: bool) -> Result<bool, SensorError> {
        debug!("received SetHeadlight request: {}", on_off(turn_on));
        let success = self.headlight.with(|h| h.set(turn_on)).inspect_err(|e| {
            error!("error setting headlight state: {e}");
        })?;
        if success {
            info!("headlight set to {}", on_off(turn_on));
        } else {
            warn!("failed to set headlight to {}", on_off(turn_on));
        }
        Ok(success)
    }
}

fn on_off(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StuckRelay;

    impl BinaryChannel for StuckRelay {
        fn set(&mut self, _state: bool) -> Result<bool, SensorError> {
            Err(SensorError::Fault("relay welded".into()))
        }

        fn get(&self) -> bool {
            true
        }
    }

    #[test]
    fn set_then_get() {
        let svc = LightingService::new();
        assert!(!svc.get_headlight_state().unwrap());
        assert!(svc.set_headlight(true).unwrap());
        assert!(svc.get_headlight_state().unwrap());
    }

    #[test]
    fn two_toggles_restore_original_state() {
        let svc = LightingService::new();
        let original = svc.get_headlight_state().unwrap();
        svc.set_headlight(!original).unwrap();
        let flipped = svc.get_headlight_state().unwrap();
        svc.set_headlight(!flipped).unwrap();
        assert_eq!(svc.get_headlight_state().unwrap(), original);
    }

    #[test]
    fn actuator_fault_is_returned() {
        let svc = LightingService::with_channel(StuckRelay);
        assert!(svc.get_headlight_state().unwrap());
        let err = svc.set_headlight(false).unwrap_err();
        assert_eq!(err, SensorError::Fault("relay welded".into()));
    }
}
