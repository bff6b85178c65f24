//! Reading sources for the state monitor.
//!
//! Real deployments plug hardware drivers in through [`ReadingSource`]. The
//! simulated and scripted sources here stand in for them.

pub mod scripted;
pub mod simulated;
pub mod types;

// Re-export commonly used types
pub use scripted::{ScriptedSource, CYCLE_SCRIPT};
pub use simulated::{
    SimulatedSensor, HUMIDITY_SENSOR_ID, PRESSURE_SENSOR_ID, TEMPERATURE_SENSOR_ID,
};
pub use types::{ReadingSource, SensorKind, SourceReading};
