//! hwtop - a hardware monitor with TUI gauges.
//!
//! Samples CPU, memory, and disk usage concurrently on a fixed cadence and
//! renders them as terminal gauges, tolerating the failure of any single
//! reading.

use anyhow::{Context, Result};
use clap::Parser;
use hwtop::collector::Collector;
use hwtop::config::{MonitorConfig, DEFAULT_DISK_PATH};
use hwtop::logging::SnapshotLogger;
use hwtop::provider::SystemProvider;
use hwtop::scheduler::{spawn_key_listener, spawn_signal_listener, ScheduleEvent, Scheduler};
use hwtop::ui::{StdoutPresenter, TuiPresenter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Hardware monitor with TUI gauges for CPU, memory, and disk
#[derive(Parser, Debug)]
#[command(name = "hwtop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Refresh interval in seconds
    #[arg(short, long, default_value = "1.0")]
    interval: f64,

    /// Disk path to monitor
    #[arg(short, long, default_value = DEFAULT_DISK_PATH)]
    disk: String,

    /// CPU sample duration in seconds (sub-interval of each refresh)
    #[arg(long, default_value = "0.1")]
    sample_duration: f64,

    /// Collection deadline in seconds for one refresh round
    #[arg(long, default_value = "5.0")]
    collect_timeout: f64,

    /// Disable TUI and print snapshots to stdout
    #[arg(long)]
    no_tui: bool,

    /// Log one JSON line per snapshot to this file
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Write diagnostic output to this file (default: hwtop.log in the
    /// system temp directory for the TUI; stderr in --no-tui mode)
    #[arg(long)]
    debug_log: Option<PathBuf>,
}

impl Args {
    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            refresh_interval: Duration::from_secs_f64(self.interval.max(0.1)),
            sample_duration: Duration::from_secs_f64(self.sample_duration.max(0.01)),
            collect_timeout: Duration::from_secs_f64(self.collect_timeout.max(0.1)),
            disk_path: self.disk.clone(),
        }
    }

    /// Where diagnostics go. An explicit --debug-log always wins. The TUI
    /// defaults to a file in the temp directory, since stderr would corrupt
    /// the alternate screen and a zeroed gauge is otherwise indistinguishable
    /// from a failed reading. `None` means stderr.
    fn debug_log_path(&self) -> Option<PathBuf> {
        match (&self.debug_log, self.no_tui) {
            (Some(path), _) => Some(path.clone()),
            (None, false) => Some(std::env::temp_dir().join("hwtop.log")),
            (None, true) => None,
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match args.debug_log_path() {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create debug log {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let config = args.monitor_config();
    let provider = Arc::new(SystemProvider::new());
    let collector = Collector::new(
        provider,
        config.sample_duration,
        config.disk_path.clone(),
    );
    let snapshot_logger = args
        .log
        .as_ref()
        .map(SnapshotLogger::new)
        .transpose()
        .context("failed to open snapshot log")?;

    let (tx, rx) = mpsc::channel::<ScheduleEvent>(16);

    if args.no_tui {
        spawn_signal_listener(tx);
        let mut scheduler = Scheduler::new(collector, StdoutPresenter, config, rx, snapshot_logger);
        scheduler.run().await?;
    } else {
        let presenter = TuiPresenter::new().context("failed to initialize terminal UI")?;
        spawn_key_listener(tx);
        let mut scheduler = Scheduler::new(collector, presenter, config, rx, snapshot_logger);
        scheduler.run().await?;
        // TuiPresenter::drop restores the terminal when the scheduler is dropped.
    }

    if let Some(path) = &args.log {
        eprintln!("Snapshots logged to: {}", path.display());
    }

    Ok(())
}
