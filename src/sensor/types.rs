//! Reading source capability and sample types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Physical quantity a source measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
}

impl SensorKind {
    /// Display unit for this quantity.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%RH",
            SensorKind::Pressure => "hPa",
        }
    }
}

/// Anything that yields one numeric value per poll.
///
/// Consecutive calls may return different values. `id` must be stable and is
/// only used for diagnostics.
pub trait ReadingSource: Send {
    fn read(&mut self) -> f64;

    fn id(&self) -> i32;

    fn kind(&self) -> SensorKind;
}

impl<S: ReadingSource + ?Sized> ReadingSource for Box<S> {
    fn read(&mut self) -> f64 {
        (**self).read()
    }

    fn id(&self) -> i32 {
        (**self).id()
    }

    fn kind(&self) -> SensorKind {
        (**self).kind()
    }
}

/// One value pulled from a source during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceReading {
    pub source_id: i32,
    pub kind: SensorKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl SourceReading {
    pub fn new(source_id: i32, kind: SensorKind, value: f64) -> Self {
        Self {
            source_id,
            kind,
            value,
            timestamp: Utc::now(),
        }
    }
}
