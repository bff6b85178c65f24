//! State Monitor Agent CLI
//!
//! Runs sensor state machines on periodic drivers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use state_monitor_agent::{
    activity::{create_shared_log, SharedActivityLog},
    config::Config,
    core::{Dispatch, StateMachine},
    logging::{self, Verbosity},
    manager::{Manager, ManagerError},
    poller::{DriverReport, Poller, TaskPoller},
    scenario::Scenario,
    DriverConfig, RULE_TABLE, VERSION,
};
use tracing::{info, warn};

/// How long the reporter waits for a report before re-checking for stop.
const REPORT_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "state-monitor")]
#[command(version = VERSION)]
#[command(about = "Threshold-driven sensor state machines on periodic drivers", long_about = None)]
struct Cli {
    /// Debug-level output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every configured driver
    Run {
        /// Source set for each manager (overrides the config file)
        #[arg(long, value_enum)]
        scenario: Option<Scenario>,

        /// Execution model for drivers
        #[arg(long, value_enum, default_value = "threads")]
        runtime: Runtime,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration: Option<u64>,

        /// Seed for simulated sensors (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Feed readings to a fresh state machine and show each step
    Replay {
        /// Readings in arrival order
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        readings: Vec<f64>,
    },

    /// Show configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },

    /// Print the transition rule table
    States,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Runtime {
    /// One OS thread per driver
    Threads,
    /// One tokio task per driver
    Tokio,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet))
        .context("failed to initialise logging")?;

    match cli.command {
        Commands::Run {
            scenario,
            runtime,
            duration,
            seed,
        } => cmd_run(scenario, runtime, duration.map(Duration::from_secs), seed),
        Commands::Replay { readings } => {
            cmd_replay(&readings);
            Ok(())
        }
        Commands::Config { write_default } => cmd_config(write_default),
        Commands::States => {
            println!("{RULE_TABLE}");
            Ok(())
        }
    }
}

fn cmd_run(
    scenario: Option<Scenario>,
    runtime: Runtime,
    duration: Option<Duration>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(scenario) = scenario {
        config.scenario = scenario;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate()?;

    println!("State Monitor Agent v{VERSION}");
    println!();
    println!("  Scenario: {:?}", config.scenario);
    println!("  Runtime: {runtime:?}");
    for driver in &config.drivers {
        println!(
            "  Driver {}: {} manager(s) every {}ms (core: {}, priority: {})",
            driver.name,
            driver.managers,
            driver.tick_interval.as_millis(),
            driver
                .core_id
                .map_or_else(|| "any".to_string(), |core| core.to_string()),
            driver.priority
        );
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("failed to set Ctrl+C handler")?;

    let deadline = duration.map(|d| Instant::now() + d);
    let keep_going = || {
        running.load(Ordering::SeqCst) && deadline.map_or(true, |at| Instant::now() < at)
    };

    let activity = create_shared_log();
    let factory = manager_factory(config.scenario, config.seed);

    match runtime {
        Runtime::Threads => run_threads(&config, &activity, factory, keep_going)?,
        Runtime::Tokio => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build tokio runtime")?;
            rt.block_on(run_tasks(&config, &activity, factory, keep_going))?;
        }
    }

    println!();
    println!("{}", activity.summary());
    Ok(())
}

/// Hands every manager in the run a distinct index so seeded sensors differ.
fn manager_factory(
    scenario: Scenario,
    seed: Option<u64>,
) -> impl FnMut(&DriverConfig, usize) -> Result<Manager, ManagerError> {
    let mut next = 0;
    move |_: &DriverConfig, _: usize| {
        let index = next;
        next += 1;
        scenario.build_manager(seed, index)
    }
}

fn run_threads<F>(
    config: &Config,
    activity: &SharedActivityLog,
    factory: F,
    keep_going: impl Fn() -> bool,
) -> Result<()>
where
    F: FnMut(&DriverConfig, usize) -> Result<Manager, ManagerError>,
{
    let poller = Poller::spawn(
        &config.drivers,
        config.report_capacity,
        SharedActivityLog::clone(activity),
        factory,
    )?;
    let reports = poller.reports().clone();

    while keep_going() {
        if let Ok(report) = reports.recv_timeout(REPORT_POLL) {
            log_report(&report);
        }
    }

    println!("Stopping drivers...");
    poller.shutdown()?;
    for report in reports.try_iter() {
        log_report(&report);
    }
    Ok(())
}

async fn run_tasks<F>(
    config: &Config,
    activity: &SharedActivityLog,
    factory: F,
    keep_going: impl Fn() -> bool,
) -> Result<()>
where
    F: FnMut(&DriverConfig, usize) -> Result<Manager, ManagerError>,
{
    let mut poller = TaskPoller::spawn(
        &config.drivers,
        config.report_capacity,
        SharedActivityLog::clone(activity),
        factory,
    )?;

    while keep_going() {
        match tokio::time::timeout(REPORT_POLL, poller.recv()).await {
            Ok(Some(report)) => log_report(&report),
            Ok(None) => break,
            Err(_) => {}
        }
    }

    println!("Stopping drivers...");
    poller.shutdown().await?;
    Ok(())
}

fn log_report(entry: &DriverReport) {
    let report = &entry.report;
    if let Some(transition) = &report.transition {
        info!(
            driver = %entry.driver,
            manager = %report.manager_id,
            "transition {} -> {}",
            transition.from,
            transition.to
        );
    }

    if report.is_alert() {
        warn!(driver = %entry.driver, tick = report.tick, "{}", report.status_line());
    } else {
        info!(driver = %entry.driver, tick = report.tick, "{}", report.status_line());
    }
}

fn cmd_replay(readings: &[f64]) {
    let mut machine = StateMachine::new();

    for (i, &value) in readings.iter().enumerate() {
        let outcome = machine.process_reading(value);
        let marker = match outcome {
            Dispatch::Transitioned(record) => format!("  ({} -> {})", record.from, record.to),
            Dispatch::Stayed | Dispatch::Ignored => String::new(),
        };
        println!("[{i:>3}] {value:>10.2}  {}{marker}", machine.describe());
    }

    println!();
    let buffer = machine.buffer();
    match (buffer.min_max(), buffer.average()) {
        (Ok((min, max)), Ok(average)) => println!(
            "Buffer: {} samples | Range: [{min:.1}, {max:.1}] | Avg: {average:.2}",
            buffer.active_count()
        ),
        (Err(e), _) | (_, Err(e)) => println!("Buffer: {e}"),
    }
    println!("Transitions: {}", machine.transition_count());
}

fn cmd_config(write_default: bool) -> Result<()> {
    let path = Config::config_path();

    let config = if write_default {
        let config = Config::default();
        config.save().context("failed to write configuration")?;
        println!("Wrote default configuration to {path:?}");
        config
    } else {
        Config::load().context("failed to load configuration")?
    };

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
