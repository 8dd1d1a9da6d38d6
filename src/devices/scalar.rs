use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::devices::types::{LEVEL_MAX, LEVEL_MIN, ScalarChannel, SensorError, clamp_level};

/// Half-width of the uniform noise band added to every reading.
pub const NOISE_AMPLITUDE: f32 = 2.0;
/// Stored level used when no configuration overrides it.
pub const DEFAULT_INITIAL_LEVEL: f32 = 75.0;
/// Decay applied per read when no configuration overrides it.
pub const DEFAULT_DECAY_RATE: f32 = 0.1;

/// Remainders smaller than this fraction of one decay step count as empty.
const DECAY_RESIDUE: f64 = 1e-6;

/// A decaying, noisy scalar sensor such as a fuel level gauge.
///
/// Every [`read`](ScalarChannel::read) consumes `decay_rate` from the stored
/// value and returns that value perturbed by uniform noise in
/// `[-NOISE_AMPLITUDE, +NOISE_AMPLITUDE]`. The noise is never written back,
/// so the stored value decays deterministically toward zero and reaches
/// exactly zero after `ceil(initial / decay_rate)` reads.
///
/// # Examples
///
/// ```
/// use zonal_sim::devices::{ScalarChannel, ScalarSensor};
///
/// let mut sensor = ScalarSensor::new(80.0, 0.1, Some(7)).unwrap();
/// let reading = sensor.read().unwrap();
/// assert!((77.9..=81.9).contains(&reading));
/// assert!((sensor.level() - 79.9).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct ScalarSensor {
    /// Stored value in percent, always within `[0, 100]`.
    value: f32,

    /// Level at construction or at the last refuel.
    anchor: f64,

    /// Decay steps applied since `anchor` was set.
    decay_steps: u64,

    /// Amount removed from `value` on each read.
    decay_rate: f32,

    /// Number of completed reads.
    sample_count: u64,

    /// Noise source, serialized together with the rest of the sensor state.
    rng: StdRng,
}

impl ScalarSensor {
    /// Creates a new sensor.
    ///
    /// # Arguments
    ///
    /// * `initial` - Starting level in percent; values outside `[0, 100]` are clamped
    /// * `decay_rate` - Level consumed per read (must be finite and >= 0)
    /// * `seed` - Noise seed; `None` seeds from the operating system
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidArgument` if `initial` is not finite or
    /// `decay_rate` is negative or not finite.
    pub fn new(initial: f32, decay_rate: f32, seed: Option<u64>) -> Result<Self, SensorError> {
        if !initial.is_finite() {
            return Err(SensorError::InvalidArgument(format!(
                "initial level must be finite, got {initial}"
            )));
        }
        if !decay_rate.is_finite() || decay_rate < 0.0 {
            return Err(SensorError::InvalidArgument(format!(
                "decay rate must be a finite value >= 0, got {decay_rate}"
            )));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let value = clamp_level(initial);
        Ok(Self {
            value,
            anchor: f64::from(value),
            decay_steps: 0,
            decay_rate,
            sample_count: 0,
            rng,
        })
    }

    /// Number of completed reads since construction.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Level consumed per read.
    pub fn decay_rate(&self) -> f32 {
        self.decay_rate
    }

    /// Applies one decay step, floored at zero.
    ///
    /// The level is recomputed from `anchor` in one multiplication so that
    /// rounding does not accumulate across steps.
    fn decay(&mut self) {
        if self.value <= LEVEL_MIN {
            return;
        }
        self.decay_steps += 1;
        let step = f64::from(self.decay_rate);
        let remaining = self.anchor - self.decay_steps as f64 * step;
        self.value = if remaining <= step * DECAY_RESIDUE {
            LEVEL_MIN
        } else {
            remaining as f32
        };
    }

    fn noise(&mut self) -> f32 {
        self.rng.random_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE)
    }
}

impl Default for ScalarSensor {
    fn default() -> Self {
        Self {
            value: DEFAULT_INITIAL_LEVEL,
            anchor: f64::from(DEFAULT_INITIAL_LEVEL),
            decay_steps: 0,
            decay_rate: DEFAULT_DECAY_RATE,
            sample_count: 0,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl ScalarChannel for ScalarSensor {
    fn read(&mut self) -> Result<f32, SensorError> {
        self.decay();

        let reading = clamp_level(self.value + self.noise());

        self.sample_count += 1;
        Ok(reading)
    }

    fn refuel(&mut self, amount: f32) -> Result<f32, SensorError> {
        if amount.is_nan() || amount < 0.0 {
            return Ok(self.value);
        }

        self.value = (self.value + amount).min(LEVEL_MAX);
        self.anchor = f64::from(self.value);
        self.decay_steps = 0;
        Ok(self.value)
    }

    fn level(&self) -> f32 {
        self.value
    }

    fn channel_type(&self) -> &'static str {
        "ScalarSensor"
    }
}
