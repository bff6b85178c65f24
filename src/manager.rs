//! Binds one state machine to a fixed set of reading sources.
//!
//! On each tick the manager reads every source in order, feeds the first
//! (primary) reading to its [`StateMachine`], keeps a per-source history, and
//! returns a [`StatusReport`]. It never logs; reporting is left to whoever
//! drives it.

use crate::core::{
    CircularBuffer, Dispatch, StateId, StateMachine, StatsError, TransitionRecord,
    SAMPLE_CAPACITY,
};
use crate::sensor::{ReadingSource, SourceReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while building or ticking a manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("a manager needs at least one reading source")]
    NoSources,
    #[error("buffer statistics unavailable: {0}")]
    Stats(#[from] StatsError),
}

/// Result of one manager tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub manager_id: Uuid,
    pub tick: u64,
    pub state_id: StateId,
    pub description: String,
    /// Live samples in the primary buffer, capped at [`SAMPLE_CAPACITY`].
    pub occupancy: usize,
    pub min: f64,
    pub max: f64,
    pub readings: Vec<SourceReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionRecord>,
    pub at: DateTime<Utc>,
}

impl StatusReport {
    /// One-line summary for log output.
    pub fn status_line(&self) -> String {
        format!(
            "State: {} | Buffer: {} samples | Range: [{:.1}, {:.1}]",
            self.description,
            self.occupancy.min(SAMPLE_CAPACITY),
            self.min,
            self.max
        )
    }

    pub fn is_alert(&self) -> bool {
        self.state_id == StateId::Alert
    }
}

struct TrackedSource {
    source: Box<dyn ReadingSource>,
    history: CircularBuffer<SAMPLE_CAPACITY>,
}

/// Owns one machine and its sources. Not shared between threads.
pub struct Manager {
    id: Uuid,
    machine: StateMachine,
    sources: Vec<TrackedSource>,
    ticks: u64,
}

impl Manager {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    /// Run one tick: read all sources, advance the machine, report.
    pub fn update(&mut self) -> Result<StatusReport, ManagerError> {
        let readings: Vec<SourceReading> = self
            .sources
            .iter_mut()
            .map(|tracked| {
                let value = tracked.source.read();
                tracked.history.push(value);
                SourceReading::new(tracked.source.id(), tracked.source.kind(), value)
            })
            .collect();

        let primary = readings.first().ok_or(ManagerError::NoSources)?;
        let outcome = self.machine.process_reading(primary.value);
        self.ticks += 1;

        let history = &self.sources[0].history;
        let (min, max) = history.min_max()?;

        Ok(StatusReport {
            manager_id: self.id,
            tick: self.ticks,
            state_id: self.machine.current_id(),
            description: self.machine.describe(),
            occupancy: history.active_count(),
            min,
            max,
            readings,
            transition: match outcome {
                Dispatch::Transitioned(record) => Some(record),
                Dispatch::Stayed | Dispatch::Ignored => None,
            },
            at: Utc::now(),
        })
    }

    pub fn current_state_id(&self) -> StateId {
        self.machine.current_id()
    }

    pub fn describe(&self) -> String {
        self.machine.describe()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Min/max of the readings tracked for the source at `index`.
    pub fn source_stats(&self, index: usize) -> Option<Result<(f64, f64), StatsError>> {
        self.sources
            .get(index)
            .map(|tracked| tracked.history.min_max())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.id)
            .field("state", &self.machine.current_id())
            .field("sources", &self.sources.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Collects the ordered source list for a [`Manager`].
#[derive(Default)]
pub struct ManagerBuilder {
    sources: Vec<Box<dyn ReadingSource>>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source. The first one added is the primary source.
    pub fn source(mut self, source: impl ReadingSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn boxed_source(mut self, source: Box<dyn ReadingSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> Result<Manager, ManagerError> {
        if self.sources.is_empty() {
            return Err(ManagerError::NoSources);
        }

        Ok(Manager {
            id: Uuid::new_v4(),
            machine: StateMachine::new(),
            sources: self
                .sources
                .into_iter()
                .map(|source| TrackedSource {
                    source,
                    history: CircularBuffer::new(),
                })
                .collect(),
            ticks: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{ScriptedSource, SensorKind, SimulatedSensor};

    fn scripted(values: &[f64]) -> ScriptedSource {
        ScriptedSource::new(1, SensorKind::Temperature, values.to_vec())
    }

    #[test]
    fn builder_requires_a_source() {
        assert!(matches!(
            Manager::builder().build(),
            Err(ManagerError::NoSources)
        ));
    }

    #[test]
    fn update_feeds_primary_source_only() {
        let mut manager = Manager::builder()
            .source(scripted(&[21.0]))
            .source(ScriptedSource::new(2, SensorKind::Humidity, vec![99.0]))
            .build()
            .unwrap();

        let report = manager.update().unwrap();

        assert_eq!(report.state_id, StateId::Monitoring);
        assert_eq!(report.readings.len(), 2);
        assert_eq!(report.readings[1].value, 99.0);
        assert_eq!((report.min, report.max), (21.0, 21.0));
        assert_eq!(manager.machine().buffer().iter().collect::<Vec<_>>(), vec![21.0]);
        assert_eq!(manager.source_stats(1).unwrap(), Ok((99.0, 99.0)));
    }

    #[test]
    fn status_line_format() {
        let mut manager = Manager::builder()
            .source(scripted(&[18.24, 21.04]))
            .build()
            .unwrap();

        let first = manager.update().unwrap();
        assert_eq!(
            first.status_line(),
            "State: Idle - Waiting for commands | Buffer: 1 samples | Range: [18.2, 18.2]"
        );

        let second = manager.update().unwrap();
        assert_eq!(
            second.status_line(),
            "State: Monitoring - Avg: 21.04, Samples: 1 | Buffer: 2 samples | Range: [18.2, 21.0]"
        );
        assert!(second.transition.is_some());
    }

    #[test]
    fn occupancy_is_capped_at_capacity() {
        let mut manager = Manager::builder()
            .source(SimulatedSensor::temperature().seeded(1))
            .build()
            .unwrap();

        let mut last = None;
        for _ in 0..(SAMPLE_CAPACITY * 3) {
            last = Some(manager.update().unwrap());
        }

        let report = last.unwrap();
        assert_eq!(report.occupancy, SAMPLE_CAPACITY);
        assert_eq!(report.tick, (SAMPLE_CAPACITY * 3) as u64);
        assert_eq!(manager.tick_count(), (SAMPLE_CAPACITY * 3) as u64);
    }

    #[test]
    fn simulated_temperature_settles_in_monitoring() {
        let mut manager = Manager::builder()
            .source(SimulatedSensor::temperature().seeded(11))
            .source(SimulatedSensor::humidity().seeded(12))
            .source(SimulatedSensor::pressure().seeded(13))
            .build()
            .unwrap();

        for _ in 0..25 {
            manager.update().unwrap();
        }
        assert_eq!(manager.current_state_id(), StateId::Monitoring);
    }
}
