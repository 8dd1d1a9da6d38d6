use crate::devices::types::{BinaryChannel, SensorError};

/// A binary on/off latch such as a headlight relay.
///
/// Starts switched off.
#[derive(Debug, Clone, Default)]
pub struct DigitalActuator {
    is_on: bool,
}

impl DigitalActuator {
    /// Creates an actuator in the given state.
    pub fn new(is_on: bool) -> Self {
        Self { is_on }
    }
}

impl BinaryChannel for DigitalActuator {
    /// Always succeeds; the flag is reserved for reporting relay faults.
    fn set(&mut self, state: bool) -> Result<bool, SensorError> {
        self.is_on = state;
        Ok(true)
    }

    fn get(&self) -> bool {
        self.is_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off() {
        assert!(!DigitalActuator::default().get());
        assert!(DigitalActuator::new(true).get());
    }

    #[test]
    fn set_then_get() {
        let mut light = DigitalActuator::default();
        assert!(light.set(true).unwrap());
        assert!(light.get());
        assert!(light.set(false).unwrap());
        assert!(!light.get());
    }

    #[test]
    fn two_toggles_restore_state() {
        for original in [false, true] {
            let mut light = DigitalActuator::new(original);
            let flipped = !light.get();
            light.set(flipped).unwrap();
            light.set(!light.get()).unwrap();
            assert_eq!(light.get(), original);
        }
    }
}
