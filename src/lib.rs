//! State Monitor Agent - threshold-driven sensor state machines.
//!
//! Each [`Manager`] pairs one [`StateMachine`] with a fixed list of reading
//! sources. Drivers tick managers on independent cadences; every tick reads
//! all sources, feeds the primary reading to the machine, and yields a
//! [`StatusReport`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     State Monitor Agent                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────┐     │
//! │  │   Sensors   │──▶│   Manager   │──▶│  StateMachine   │     │
//! │  │ (read/id)   │   │ (per tick)  │   │ + SampleBuffer  │     │
//! │  └─────────────┘   └─────────────┘   └─────────────────┘     │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌─────────────┐   ┌─────────────┐                           │
//! │  │   Poller    │──▶│  Activity   │                           │
//! │  │ (drivers)   │   │    Log      │                           │
//! │  └─────────────┘   └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use state_monitor_agent::core::{StateId, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! machine.process_reading(20.0);
//! assert_eq!(machine.current_id(), StateId::Idle);
//!
//! machine.process_reading(21.0);
//! assert_eq!(machine.current_id(), StateId::Monitoring);
//! assert_eq!(machine.describe(), "Monitoring - Avg: 21.00, Samples: 1");
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod logging;
pub mod manager;
pub mod poller;
pub mod scenario;
pub mod sensor;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use config::{Config, ConfigError, DriverConfig};
pub use crate::core::{
    CircularBuffer, Dispatch, Event, State, StateId, StateMachine, StatsError, TransitionRecord,
    SAMPLE_CAPACITY,
};
pub use manager::{Manager, ManagerBuilder, ManagerError, StatusReport};
pub use poller::{DriverReport, Poller, PollerError, TaskPoller};
pub use scenario::Scenario;
pub use sensor::{ReadingSource, ScriptedSource, SensorKind, SimulatedSensor, SourceReading};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Transition rules, for display.
pub const RULE_TABLE: &str = r#"
State         Event           Rule
------------  --------------  ------------------------------------------------
Idle          Reading(v)      v > 20.0            -> Monitoring { avg: v, samples: 1 }
Monitoring    Reading(v)      samples += 1, avg = buffer average
                              avg > 30.0          -> Alert { "Temperature High", 30.0 }
Alert         Reading(v)      v < 25.0            -> Calibrating { ref: 22.5, step: 1 }
Calibrating   Reading(v)      step += 1, step > 5 -> Idle
Monitoring    Fault { code }                      -> Alert { "Sensor Fault", 30.0 }
(any other)   Fault { code }  ignored
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_lists_every_state() {
        for id in [
            StateId::Idle,
            StateId::Monitoring,
            StateId::Alert,
            StateId::Calibrating,
        ] {
            assert!(RULE_TABLE.contains(id.name()));
        }
    }
}
