//! Operating modes of the sensor state machine.
//!
//! [`State`] is a closed set of variants. Each variant carries only the data
//! that mode needs, and a state is always replaced wholesale on transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reading strictly above this moves `Idle` into `Monitoring`.
pub const MONITOR_ENTRY_THRESHOLD: f64 = 20.0;

/// A running average strictly above this raises an alert.
pub const ALERT_THRESHOLD: f64 = 30.0;

/// A reading strictly below this while alerting starts calibration.
pub const ALERT_CLEAR_THRESHOLD: f64 = 25.0;

/// Reference value every calibration run starts from.
pub const CALIBRATION_REFERENCE: f64 = 22.5;

/// Calibration returns to `Idle` once the step counter exceeds this.
pub const CALIBRATION_STEPS: u32 = 5;

pub const HIGH_TEMPERATURE_MESSAGE: &str = "Temperature High";
pub const SENSOR_FAULT_MESSAGE: &str = "Sensor Fault";

/// Cheap discriminant of the live [`State`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateId {
    Idle,
    Monitoring,
    Alert,
    Calibrating,
}

impl StateId {
    pub fn name(&self) -> &'static str {
        match self {
            StateId::Idle => "Idle",
            StateId::Monitoring => "Monitoring",
            StateId::Alert => "Alert",
            StateId::Calibrating => "Calibrating",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The machine's current operating mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum State {
    /// Waiting for a reading above the entry threshold.
    #[default]
    Idle,
    /// Tracking the buffer average.
    Monitoring {
        running_average: f64,
        sample_count: u32,
    },
    /// Average crossed the alert threshold.
    Alert { message: String, threshold: f64 },
    /// Counting calibration steps before returning to idle.
    Calibrating { reference_value: f64, step: u32 },
}

impl State {
    pub fn monitoring(first_reading: f64) -> Self {
        State::Monitoring {
            running_average: first_reading,
            sample_count: 1,
        }
    }

    pub fn high_temperature() -> Self {
        State::Alert {
            message: HIGH_TEMPERATURE_MESSAGE.to_string(),
            threshold: ALERT_THRESHOLD,
        }
    }

    pub fn calibrating() -> Self {
        State::Calibrating {
            reference_value: CALIBRATION_REFERENCE,
            step: 1,
        }
    }

    pub fn id(&self) -> StateId {
        match self {
            State::Idle => StateId::Idle,
            State::Monitoring { .. } => StateId::Monitoring,
            State::Alert { .. } => StateId::Alert,
            State::Calibrating { .. } => StateId::Calibrating,
        }
    }

    /// Human-readable rendering, one fixed template per variant.
    pub fn describe(&self) -> String {
        match self {
            State::Idle => "Idle - Waiting for commands".to_string(),
            State::Monitoring {
                running_average,
                sample_count,
            } => format!("Monitoring - Avg: {running_average:.2}, Samples: {sample_count}"),
            State::Alert { message, threshold } => {
                format!("ALERT: {message} (Threshold: {threshold:.1})")
            }
            State::Calibrating {
                reference_value,
                step,
            } => format!("Calibrating - Ref: {reference_value:.2}, Step: {step}"),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
