//! Source sets a manager can be built with.

use crate::manager::{Manager, ManagerError};
use crate::sensor::{ScriptedSource, SimulatedSensor, TEMPERATURE_SENSOR_ID};
use serde::{Deserialize, Serialize};

/// Which reading sources back each manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Simulated temperature, humidity and pressure sensors.
    Ambient,
    /// Scripted temperature that loops through every state, plus simulated
    /// humidity and pressure.
    Cycle,
}

impl Scenario {
    /// Build a fresh manager for this scenario.
    ///
    /// With a seed, each simulated sensor gets a distinct seed derived from it
    /// and from `index`, so managers do not mirror each other.
    pub fn build_manager(
        &self,
        seed: Option<u64>,
        index: usize,
    ) -> Result<Manager, ManagerError> {
        let seeded = |sensor: SimulatedSensor, offset: u64| match seed {
            Some(seed) => sensor.seeded(
                seed.wrapping_mul(31)
                    .wrapping_add(index as u64 * 3)
                    .wrapping_add(offset),
            ),
            None => sensor,
        };

        let builder = match self {
            Scenario::Ambient => {
                Manager::builder().source(seeded(SimulatedSensor::temperature(), 0))
            }
            Scenario::Cycle => {
                Manager::builder().source(ScriptedSource::cycle(TEMPERATURE_SENSOR_ID))
            }
        };

        builder
            .source(seeded(SimulatedSensor::humidity(), 1))
            .source(seeded(SimulatedSensor::pressure(), 2))
            .build()
    }
}
