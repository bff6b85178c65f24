//! Thread-per-driver poller.

use super::{build_managers, tick_managers, DriverReport, PollerError};
use crate::activity::SharedActivityLog;
use crate::config::DriverConfig;
use crate::manager::{Manager, ManagerError};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives managers on dedicated OS threads.
///
/// Dropping the poller without calling [`Poller::shutdown`] still stops the
/// drivers (their stop channel disconnects) but does not wait for them.
pub struct Poller {
    stop: Option<Sender<()>>,
    drivers: Vec<(String, JoinHandle<()>)>,
    reports: Receiver<DriverReport>,
}

impl Poller {
    /// Start one thread per driver config.
    ///
    /// `factory` is called with the driver config and the manager index for
    /// every manager the driver owns, before any thread starts.
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

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (report_tx, report_rx) = bounded(report_capacity.max(1));
        let mut drivers = Vec::with_capacity(planned.len());

        for (config, managers) in planned {
            let name = config.name.clone();
            let mut builder = thread::Builder::new().name(name.clone());
            if let Some(bytes) = config.thread_stack_size() {
                builder = builder.stack_size(bytes);
            }

            let context = DriverContext {
                config,
                managers,
                activity: SharedActivityLog::clone(&activity),
                stop: stop_rx.clone(),
                reports: report_tx.clone(),
            };

            match builder.spawn(move || context.run()) {
                Ok(handle) => drivers.push((name, handle)),
                Err(source) => {
                    drop(stop_tx);
                    for (_, handle) in drivers {
                        let _ = handle.join();
                    }
                    return Err(PollerError::Spawn { name, source });
                }
            }
        }

        Ok(Self {
            stop: Some(stop_tx),
            drivers,
            reports: report_rx,
        })
    }

    /// Channel carrying status reports from every driver.
    pub fn reports(&self) -> &Receiver<DriverReport> {
        &self.reports
    }

    pub fn driver_names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Signal every driver to stop and wait for them to finish.
    pub fn shutdown(mut self) -> Result<(), PollerError> {
        // Disconnecting the stop channel wakes every driver's select.
        self.stop.take();

        let mut panicked = None;
        for (name, handle) in self.drivers.drain(..) {
            if handle.join().is_err() {
                warn!(driver = %name, "driver thread panicked");
                panicked.get_or_insert(name);
            }
        }

        match panicked {
            Some(name) => Err(PollerError::Panicked(name)),
            None => Ok(()),
        }
    }
}

/// Everything one driver thread owns.
struct DriverContext {
    config: DriverConfig,
    managers: Vec<Manager>,
    activity: SharedActivityLog,
    stop: Receiver<()>,
    reports: Sender<DriverReport>,
}

impl DriverContext {
    fn run(mut self) {
        let name = self.config.name.clone();
        info!(
            driver = %name,
            core = ?self.config.core_id,
            priority = self.config.priority,
            stack = ?self.config.stack_size,
            managers = self.managers.len(),
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "driver started"
        );

        let ticker = tick(self.config.tick_interval);
        let stop = self.stop.clone();
        self.tick_once(&name);

        loop {
            select! {
                recv(stop) -> _ => break,
                recv(ticker) -> _ => self.tick_once(&name),
            }
        }

        debug!(driver = %name, "driver stopped");
    }

    fn tick_once(&mut self, name: &str) {
        let reports = &self.reports;
        tick_managers(name, &mut self.managers, &self.activity, |report| {
            reports.try_send(report).is_ok()
        });
    }
}

/// Wait up to `timeout` for the next report from any driver.
pub fn recv_for(reports: &Receiver<DriverReport>, timeout: Duration) -> Option<DriverReport> {
    reports.recv_timeout(timeout).ok()
}
