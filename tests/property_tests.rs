//! Property-based tests for the sample buffer and state machine.

use proptest::prelude::*;
use state_monitor_agent::core::{CircularBuffer, StateId, StateMachine, SAMPLE_CAPACITY};

const N: usize = 10;

proptest! {
    #[test]
    fn buffer_keeps_most_recent_samples(values in prop::collection::vec(-1000.0f64..1000.0, 0..40)) {
        let mut buffer = CircularBuffer::<N>::new();
        for &v in &values {
            buffer.push(v);
        }

        prop_assert_eq!(buffer.active_count(), values.len().min(N));
        let start = values.len().saturating_sub(N);
        prop_assert_eq!(buffer.iter().collect::<Vec<_>>(), values[start..].to_vec());
    }

    #[test]
    fn min_max_bounds_every_live_sample(values in prop::collection::vec(-1000.0f64..1000.0, 1..40)) {
        let mut buffer = CircularBuffer::<N>::new();
        for &v in &values {
            buffer.push(v);
        }

        let (min, max) = buffer.min_max().unwrap();
        let average = buffer.average().unwrap();
        for v in buffer.iter() {
            prop_assert!(min <= v && v <= max);
        }
        prop_assert!(min <= average + 1e-9 && average <= max + 1e-9);
    }

    #[test]
    fn processing_is_deterministic(values in prop::collection::vec(0.0f64..120.0, 0..60)) {
        let mut a = StateMachine::new();
        let mut b = StateMachine::new();
        for &v in &values {
            a.process_reading(v);
            b.process_reading(v);
        }

        prop_assert_eq!(a.state(), b.state());
        prop_assert_eq!(a.buffer().iter().collect::<Vec<_>>(), b.buffer().iter().collect::<Vec<_>>());
    }

    #[test]
    fn readings_at_or_below_entry_threshold_stay_idle(values in prop::collection::vec(-50.0f64..=20.0, 0..30)) {
        let mut machine = StateMachine::new();
        for &v in &values {
            machine.process_reading(v);
        }
        prop_assert_eq!(machine.current_id(), StateId::Idle);
        prop_assert_eq!(machine.buffer().active_count(), values.len().min(SAMPLE_CAPACITY));
    }
}
