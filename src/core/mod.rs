//! State machine core.
//!
//! This module contains:
//! - The fixed-capacity sample buffer and its statistics
//! - The closed set of operating states
//! - The state machine and its transition rules

pub mod buffer;
pub mod machine;
pub mod state;

// Re-export commonly used types
pub use buffer::{CircularBuffer, StatsError, SAMPLE_CAPACITY};
pub use machine::{Dispatch, Event, StateMachine, TransitionRecord};
pub use state::{State, StateId};
