//! The sensor state machine.
//!
//! [`StateMachine::dispatch`] is the single visitation point: it matches the
//! live state variant against the incoming [`Event`] and applies exactly one
//! rule. Pairings outside the rule table are reported as
//! [`Dispatch::Ignored`] and leave the machine untouched.
//!
//! | State        | Event          | Rule                                          |
//! |--------------|----------------|-----------------------------------------------|
//! | Idle         | Reading(v)     | `v > 20.0` → Monitoring { v, 1 }              |
//! | Monitoring   | Reading(_)     | count += 1, avg = buffer average; `avg > 30.0` → Alert |
//! | Alert        | Reading(v)     | `v < 25.0` → Calibrating { 22.5, 1 }          |
//! | Calibrating  | Reading(_)     | step += 1; `step > 5` → Idle                  |
//! | Monitoring   | Fault { code } | → Alert { "Sensor Fault", 30.0 }              |
//! | any other    | Fault { code } | ignored                                       |

use super::buffer::{CircularBuffer, StatsError, SAMPLE_CAPACITY};
use super::state::{
    State, StateId, ALERT_CLEAR_THRESHOLD, ALERT_THRESHOLD, CALIBRATION_STEPS,
    MONITOR_ENTRY_THRESHOLD, SENSOR_FAULT_MESSAGE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A new primary sensor sample.
    Reading(f64),
    /// A source reported a hardware fault.
    Fault { code: i32 },
}

/// Record of a single state change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: StateId,
    pub to: StateId,
    pub at: DateTime<Utc>,
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// A rule ran but kept the current variant.
    Stayed,
    /// A rule replaced the current state.
    Transitioned(TransitionRecord),
    /// No rule exists for this (state, event) pairing.
    Ignored,
}

impl Dispatch {
    pub fn transition(&self) -> Option<&TransitionRecord> {
        match self {
            Dispatch::Transitioned(record) => Some(record),
            _ => None,
        }
    }
}

/// Owns one [`State`] and the sample buffer its rules read from.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: State,
    current_id: StateId,
    buffer: CircularBuffer<SAMPLE_CAPACITY>,
    last_transition: Option<TransitionRecord>,
    transitions: u64,
}

impl StateMachine {
    /// Create a machine in `Idle` with an empty buffer.
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            current_id: StateId::Idle,
            buffer: CircularBuffer::new(),
            last_transition: None,
            transitions: 0,
        }
    }

    /// Replace the current state wholesale.
    pub fn transition_to(&mut self, new_state: State) -> TransitionRecord {
        let record = TransitionRecord {
            from: self.current_id,
            to: new_state.id(),
            at: Utc::now(),
        };
        self.state = new_state;
        self.current_id = self.state.id();
        self.last_transition = Some(record);
        self.transitions += 1;

        debug!(from = %record.from, to = %record.to, "state transition");
        record
    }

    /// Buffer `value` and evaluate the rule for the current state.
    pub fn process_reading(&mut self, value: f64) -> Dispatch {
        self.dispatch(Event::Reading(value))
    }

    /// Apply the rule for (current state, `event`).
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        if let Event::Reading(value) = event {
            self.buffer.push(value);
        }

        let next = match (&mut self.state, event) {
            (State::Idle, Event::Reading(value)) => {
                (value > MONITOR_ENTRY_THRESHOLD).then(|| State::monitoring(value))
            }
            (
                State::Monitoring {
                    running_average,
                    sample_count,
                },
                Event::Reading(_),
            ) => {
                *sample_count += 1;
                if let Ok(average) = self.buffer.average() {
                    *running_average = average;
                }
                (*running_average > ALERT_THRESHOLD).then(State::high_temperature)
            }
            (State::Alert { .. }, Event::Reading(value)) => {
                (value < ALERT_CLEAR_THRESHOLD).then(State::calibrating)
            }
            (State::Calibrating { step, .. }, Event::Reading(_)) => {
                *step += 1;
                (*step > CALIBRATION_STEPS).then_some(State::Idle)
            }
            (State::Monitoring { .. }, Event::Fault { code }) => Some(State::Alert {
                message: format!("{SENSOR_FAULT_MESSAGE} (code {code})"),
                threshold: ALERT_THRESHOLD,
            }),
            (state, event) => {
                trace!(state = %state.id(), ?event, "unhandled event ignored");
                return Dispatch::Ignored;
            }
        };

        match next {
            Some(state) => Dispatch::Transitioned(self.transition_to(state)),
            None => Dispatch::Stayed,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn current_id(&self) -> StateId {
        self.current_id
    }

    /// Render the live state with its variant template.
    pub fn describe(&self) -> String {
        self.state.describe()
    }

    /// Minimum and maximum over the buffered samples.
    pub fn buffer_stats(&self) -> Result<(f64, f64), StatsError> {
        self.buffer.min_max()
    }

    pub fn buffer(&self) -> &CircularBuffer<SAMPLE_CAPACITY> {
        &self.buffer
    }

    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.last_transition.as_ref()
    }

    /// Transitions applied since construction.
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(state: State) -> StateMachine {
        let mut machine = StateMachine::new();
        machine.transition_to(state);
        machine
    }

    #[test]
    fn starts_idle_with_empty_buffer() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_id(), StateId::Idle);
        assert_eq!(machine.buffer_stats(), Err(StatsError::EmptyBuffer));
        assert!(machine.last_transition().is_none());
    }

    #[test]
    fn idle_entry_threshold_is_strict() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.process_reading(20.0), Dispatch::Stayed);
        assert_eq!(machine.current_id(), StateId::Idle);

        let outcome = machine.process_reading(20.0001);
        assert_eq!(
            outcome.transition().map(|t| (t.from, t.to)),
            Some((StateId::Idle, StateId::Monitoring))
        );
        assert_eq!(machine.state(), &State::monitoring(20.0001));
    }

    #[test]
    fn monitoring_average_tracks_buffer() {
        let mut machine = StateMachine::new();
        machine.process_reading(21.0);
        machine.process_reading(23.0);

        match machine.state() {
            State::Monitoring {
                running_average,
                sample_count,
            } => {
                assert_eq!(*sample_count, 2);
                assert_eq!(*running_average, 22.0);
                assert_eq!(Ok(*running_average), machine.buffer().average());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn monitoring_average_at_threshold_does_not_alert() {
        let mut machine = StateMachine::new();
        machine.process_reading(21.0);
        // (21 + 39) / 2 == 30.0 exactly
        assert_eq!(machine.process_reading(39.0), Dispatch::Stayed);
        assert_eq!(machine.current_id(), StateId::Monitoring);

        machine.process_reading(31.0);
        assert_eq!(machine.current_id(), StateId::Alert);
        assert_eq!(machine.state(), &State::high_temperature());
    }

    #[test]
    fn alert_clears_below_threshold() {
        let mut machine = machine_in(State::high_temperature());
        assert_eq!(machine.process_reading(25.0), Dispatch::Stayed);
        assert_eq!(machine.current_id(), StateId::Alert);

        machine.process_reading(24.9);
        assert_eq!(machine.state(), &State::calibrating());
    }

    #[test]
    fn calibration_returns_to_idle_after_five_steps() {
        let mut machine = machine_in(State::calibrating());
        for expected_step in 2..=5 {
            machine.process_reading(0.0);
            assert_eq!(
                machine.state(),
                &State::Calibrating {
                    reference_value: 22.5,
                    step: expected_step
                }
            );
        }
        machine.process_reading(0.0);
        assert_eq!(machine.current_id(), StateId::Idle);
    }

    #[test]
    fn nan_readings_never_cross_thresholds() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.process_reading(f64::NAN), Dispatch::Stayed);
        assert_eq!(machine.current_id(), StateId::Idle);

        let mut alerting = machine_in(State::high_temperature());
        alerting.process_reading(f64::NAN);
        assert_eq!(alerting.current_id(), StateId::Alert);
    }

    #[test]
    fn fault_is_ignored_outside_monitoring() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.dispatch(Event::Fault { code: 7 }), Dispatch::Ignored);
        assert_eq!(machine.current_id(), StateId::Idle);
        assert!(machine.buffer().is_empty());
    }

    #[test]
    fn fault_while_monitoring_raises_alert() {
        let mut machine = StateMachine::new();
        machine.process_reading(22.0);
        machine.dispatch(Event::Fault { code: 3 });

        assert_eq!(
            machine.state(),
            &State::Alert {
                message: "Sensor Fault (code 3)".to_string(),
                threshold: 30.0
            }
        );
    }

    #[test]
    fn transition_to_updates_discriminant() {
        let mut machine = StateMachine::new();
        let record = machine.transition_to(State::calibrating());

        assert_eq!(record.from, StateId::Idle);
        assert_eq!(record.to, StateId::Calibrating);
        assert_eq!(machine.current_id(), StateId::Calibrating);
        assert_eq!(machine.transition_count(), 1);
    }
}
