//! A source that replays a fixed sequence of values.

use crate::sensor::types::{ReadingSource, SensorKind};

/// Readings that walk one full Idle → Monitoring → Alert → Calibrating → Idle
/// loop when fed to a fresh machine.
pub const CYCLE_SCRIPT: &[f64] = &[
    18.0, 21.0, 22.0, 23.0, 24.0, 25.0, 100.0, 24.0, 22.0, 22.0, 22.0, 22.0, 22.0,
];

/// Replays `values` in order, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    id: i32,
    kind: SensorKind,
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// An empty script reads as `NaN`.
    pub fn new(id: i32, kind: SensorKind, values: impl Into<Vec<f64>>) -> Self {
        Self {
            id,
            kind,
            values: values.into(),
            cursor: 0,
        }
    }

    /// Temperature source replaying [`CYCLE_SCRIPT`].
    pub fn cycle(id: i32) -> Self {
        Self::new(id, SensorKind::Temperature, CYCLE_SCRIPT)
    }

    /// Number of values read so far.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl ReadingSource for ScriptedSource {
    fn read(&mut self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }
}
