//! Periodic drivers for managers.
//!
//! Each driver owns its managers exclusively and ticks them on its own
//! cadence. Drivers share nothing but the [`ActivityLog`] counters and the
//! report channel. Two flavours exist:
//!
//! - [`Poller`]: one OS thread per driver, ticks from `crossbeam_channel::tick`
//! - [`TaskPoller`]: one tokio task per driver, ticks from `tokio::time::interval`
//!
//! Both check for stop between ticks only; a tick always runs to completion.

pub mod task;
pub mod thread;

pub use task::TaskPoller;
pub use thread::Poller;

use crate::activity::ActivityLog;
use crate::config::DriverConfig;
use crate::core::StateId;
use crate::manager::{Manager, ManagerError, StatusReport};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while starting or stopping drivers.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("driver '{0}' has a zero tick interval")]
    ZeroInterval(String),
    #[error("failed to build manager for driver '{driver}': {source}")]
    Manager {
        driver: String,
        #[source]
        source: ManagerError,
    },
    #[error("failed to spawn driver '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("driver '{0}' panicked")]
    Panicked(String),
}

/// A status report tagged with the driver that produced it.
#[derive(Debug, Clone)]
pub struct DriverReport {
    pub driver: String,
    pub report: StatusReport,
}

/// Build every manager a driver owns.
pub(crate) fn build_managers<F>(
    config: &DriverConfig,
    factory: &mut F,
) -> Result<Vec<Manager>, PollerError>
where
    F: FnMut(&DriverConfig, usize) -> Result<Manager, ManagerError>,
{
    if config.tick_interval.is_zero() {
        return Err(PollerError::ZeroInterval(config.name.clone()));
    }

    (0..config.managers)
        .map(|index| {
            factory(config, index).map_err(|source| PollerError::Manager {
                driver: config.name.clone(),
                source,
            })
        })
        .collect()
}

/// Run one tick over every manager of a driver.
///
/// `emit` hands a report to the consumer and returns `false` if it had to be
/// dropped. A manager error skips that manager for this tick only.
pub(crate) fn tick_managers<E>(
    driver: &str,
    managers: &mut [Manager],
    activity: &ActivityLog,
    mut emit: E,
) where
    E: FnMut(DriverReport) -> bool,
{
    for manager in managers.iter_mut() {
        if manager.current_state_id() == StateId::Alert {
            warn!(driver, manager = %manager.id(), "critical alert state");
        }

        match manager.update() {
            Ok(report) => {
                activity.record_tick();
                if let Some(transition) = &report.transition {
                    activity.record_transition();
                    if transition.to == StateId::Alert {
                        activity.record_alert();
                    }
                    debug!(
                        driver,
                        manager = %report.manager_id,
                        from = %transition.from,
                        to = %transition.to,
                        "manager changed state"
                    );
                }

                let delivered = emit(DriverReport {
                    driver: driver.to_string(),
                    report,
                });
                if !delivered {
                    activity.record_dropped_report();
                }
            }
            Err(e) => {
                activity.record_skipped_tick();
                warn!(driver, manager = %manager.id(), error = %e, "tick skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{ScriptedSource, SensorKind};
    use std::time::Duration;

    fn scripted_manager(values: &[f64]) -> Manager {
        Manager::builder()
            .source(ScriptedSource::new(1, SensorKind::Temperature, values.to_vec()))
            .build()
            .unwrap()
    }

    #[test]
    fn tick_records_activity() {
        let activity = ActivityLog::new();
        let mut managers = vec![scripted_manager(&[21.0, 100.0]), scripted_manager(&[5.0])];
        let mut reports = Vec::new();

        tick_managers("test", &mut managers, &activity, |r| {
            reports.push(r);
            true
        });
        tick_managers("test", &mut managers, &activity, |_| false);

        let stats = activity.stats();
        assert_eq!(stats.ticks, 4);
        // Idle -> Monitoring on the first tick, Monitoring -> Alert on the second.
        assert_eq!(stats.transitions, 2);
        assert_eq!(stats.alerts, 1);
        assert_eq!(stats.dropped_reports, 2);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].driver, "test");
    }

    #[test]
    fn build_managers_rejects_zero_interval() {
        let config = DriverConfig::new("stalled", Duration::ZERO);
        let result = build_managers(&config, &mut |_, _| Ok(scripted_manager(&[1.0])));
        assert!(matches!(result, Err(PollerError::ZeroInterval(name)) if name == "stalled"));
    }

    #[test]
    fn build_managers_propagates_factory_errors() {
        let config = DriverConfig::new("empty", Duration::from_millis(5));
        let result = build_managers(&config, &mut |_, _| Manager::builder().build());
        assert!(matches!(result, Err(PollerError::Manager { .. })));
    }

    #[test]
    fn build_managers_passes_indices() {
        let config = DriverConfig::new("multi", Duration::from_millis(5)).with_managers(3);
        let mut seen = Vec::new();
        let managers = build_managers(&config, &mut |_, index| {
            seen.push(index);
            Ok(scripted_manager(&[1.0]))
        })
        .unwrap();
        assert_eq!(managers.len(), 3);
        assert_eq!(seen, vec![0, 1, 2]);
    }
}
