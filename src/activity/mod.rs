//! Run-wide activity accounting shared by every driver.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
