//! Randomised stand-ins for real hardware sensors.
//!
//! Each reading is `base + k * step` with `k` drawn uniformly from `0..100`.

use crate::sensor::types::{ReadingSource, SensorKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const TEMPERATURE_SENSOR_ID: i32 = 1;
pub const HUMIDITY_SENSOR_ID: i32 = 2;
pub const PRESSURE_SENSOR_ID: i32 = 3;

/// A simulated sensor producing bounded random readings.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    id: i32,
    kind: SensorKind,
    base: f64,
    step: f64,
    rng: StdRng,
}

impl SimulatedSensor {
    /// Create a sensor seeded from OS entropy.
    pub fn new(id: i32, kind: SensorKind, base: f64, step: f64) -> Self {
        Self::with_rng(id, kind, base, step, StdRng::from_entropy())
    }

    fn with_rng(id: i32, kind: SensorKind, base: f64, step: f64, rng: StdRng) -> Self {
        Self {
            id,
            kind,
            base,
            step,
            rng,
        }
    }

    /// Reseed so the reading sequence is reproducible.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 23.5 .. 24.49 °C
    pub fn temperature() -> Self {
        Self::new(TEMPERATURE_SENSOR_ID, SensorKind::Temperature, 23.5, 0.01)
    }

    /// 45.0 .. 46.98 %RH
    pub fn humidity() -> Self {
        Self::new(HUMIDITY_SENSOR_ID, SensorKind::Humidity, 45.0, 0.02)
    }

    /// 1013.25 .. 1018.2 hPa
    pub fn pressure() -> Self {
        Self::new(PRESSURE_SENSOR_ID, SensorKind::Pressure, 1013.25, 0.05)
    }

    /// Inclusive lower and exclusive upper bound of produced values.
    pub fn range(&self) -> (f64, f64) {
        (self.base, self.base + 100.0 * self.step)
    }
}

impl ReadingSource for SimulatedSensor {
    fn read(&mut self) -> f64 {
        let k: u32 = self.rng.gen_range(0..100);
        self.base + f64::from(k) * self.step
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }
}
