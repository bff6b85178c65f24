//! Tokio task-per-driver poller.

use super::{build_managers, tick_managers, DriverReport, PollerError};
use crate::activity::SharedActivityLog;
use crate::config::DriverConfig;
use crate::manager::{Manager, ManagerError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Drives managers as tasks on the current tokio runtime.
///
/// `core_id` and `stack_size` have no meaning for tasks and are only logged.
pub struct TaskPoller {
    stop: watch::Sender<bool>,
    drivers: Vec<(String, JoinHandle<()>)>,
    reports: mpsc::Receiver<DriverReport>,
}

impl TaskPoller {
    /// Start one task per driver config. Must be called inside a runtime.
    pub fn spawn<F>(
        configs: &[DriverConfig],
        report_capacity: usize,
        activity: SharedActivityLog,
        mut factory: F,
    ) -> Result<Self, PollerError>
    where
        F: FnMut(&DriverConfig, usize) -> Result<Manager, ManagerError>,
    {
        let mut planned = Vec::with_capacity(configs.len());
        for config in configs {
            planned.push((config.clone(), build_managers(config, &mut factory)?));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (report_tx, report_rx) = mpsc::channel(report_capacity.max(1));

        let drivers = planned
            .into_iter()
            .map(|(config, managers)| {
                let name = config.name.clone();
                let handle = tokio::spawn(drive(
                    config,
                    managers,
                    SharedActivityLog::clone(&activity),
                    stop_rx.clone(),
                    report_tx.clone(),
                ));
                (name, handle)
            })
            .collect();

        Ok(Self {
            stop: stop_tx,
            drivers,
            reports: report_rx,
        })
    }

    /// Next report from any driver; `None` once every driver has exited.
    pub async fn recv(&mut self) -> Option<DriverReport> {
        self.reports.recv().await
    }

    pub fn driver_names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Signal every driver to stop and wait for them to finish.
    pub async fn shutdown(self) -> Result<(), PollerError> {
        let _ = self.stop.send(true);

        let mut panicked = None;
        for (name, handle) in self.drivers {
            if let Err(e) = handle.await {
                warn!(driver = %name, error = %e, "driver task failed");
                panicked.get_or_insert(name);
            }
        }

        match panicked {
            Some(name) => Err(PollerError::Panicked(name)),
            None => Ok(()),
        }
    }
}

async fn drive(
    config: DriverConfig,
    mut managers: Vec<Manager>,
    activity: SharedActivityLog,
    mut stop: watch::Receiver<bool>,
    reports: mpsc::Sender<DriverReport>,
) {
    let name = config.name;
    info!(
        driver = %name,
        core = ?config.core_id,
        priority = config.priority,
        managers = managers.len(),
        interval_ms = config.tick_interval.as_millis() as u64,
        "driver task started"
    );

    let mut ticker = interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                tick_managers(&name, &mut managers, &activity, |report| {
                    reports.try_send(report).is_ok()
                });
            }
        }
    }

    debug!(driver = %name, "driver task stopped");
}
