//! Refresh scheduling and event dispatch.
//!
//! A single dispatch loop waits on whichever fires first: the periodic tick
//! or an external event (resize, quit). Each tick runs exactly one
//! collection round; the round is awaited inline, so at most one round is
//! ever in flight and the previous render has finished before the next one
//! starts. Concurrency lives entirely inside the collector's fan-out.

use crate::aggregator::{aggregate, Snapshot};
use crate::collector::Collector;
use crate::config::MonitorConfig;
use crate::logging::SnapshotLogger;
use crate::provider::MetricProvider;
use crate::ui::Presenter;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// External occurrences the dispatch loop reacts to. Created per occurrence,
/// consumed immediately, never queued beyond the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    Tick,
    Resize { width: u16, height: u16 },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Owns the periodic timer, the event channel, and the lifecycle of the
/// collect-aggregate-render pipeline.
pub struct Scheduler<P, R> {
    collector: Collector<P>,
    presenter: R,
    config: MonitorConfig,
    events: mpsc::Receiver<ScheduleEvent>,
    snapshot_logger: Option<SnapshotLogger>,
    last_snapshot: Option<Snapshot>,
    state: SchedulerState,
}

impl<P: MetricProvider, R: Presenter> Scheduler<P, R> {
    pub fn new(
        collector: Collector<P>,
        presenter: R,
        config: MonitorConfig,
        events: mpsc::Receiver<ScheduleEvent>,
        snapshot_logger: Option<SnapshotLogger>,
    ) -> Self {
        Self {
            collector,
            presenter,
            config,
            events,
            snapshot_logger,
            last_snapshot: None,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Runs the dispatch loop until a quit event arrives or the event source
    /// closes. The first tick fires immediately, so the operator sees data
    /// without waiting a full interval.
    pub async fn run(&mut self) -> Result<()> {
        self.state = SchedulerState::Running;
        let mut tick = tokio::time::interval(self.config.refresh_interval);
        // A round that overruns its tick must not cause a burst of catch-up
        // rounds: one aggregation pass per scheduled tick, at most.
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                _ = tick.tick() => ScheduleEvent::Tick,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => ScheduleEvent::Quit,
                },
            };

            match self.dispatch(event).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    // A fatal dispatch error also ends the loop; the state
                    // must reflect that the scheduler is no longer running.
                    self.state = SchedulerState::Stopped;
                    return Err(err);
                }
            }
        }

        self.state = SchedulerState::Stopped;
        Ok(())
    }

    /// Handles one event; returns false when the loop should exit.
    async fn dispatch(&mut self, event: ScheduleEvent) -> Result<bool> {
        match event {
            ScheduleEvent::Tick => {
                self.run_round().await?;
            }
            ScheduleEvent::Resize { width, height } => {
                self.presenter.on_resize(width, height);
                // Redraw immediately with last-known data; only collect if
                // no round has completed yet.
                match self.last_snapshot.clone() {
                    Some(snapshot) => self.presenter.render(&snapshot)?,
                    None => self.run_round().await?,
                }
            }
            ScheduleEvent::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn run_round(&mut self) -> Result<()> {
        let mut samples = self.collector.collect();
        let snapshot = aggregate(
            &mut samples,
            &self.config.disk_path,
            self.config.collect_timeout,
        )
        .await;

        if let Some(logger) = &mut self.snapshot_logger {
            if let Err(err) = logger.log(&snapshot) {
                tracing::warn!(error = %err, "failed to write snapshot log");
            }
        }

        self.presenter.render(&snapshot)?;
        self.last_snapshot = Some(snapshot);
        Ok(())
    }
}

/// Translates crossterm terminal events into schedule events on a dedicated
/// thread (crossterm reads are blocking). Exits after forwarding a quit, on
/// terminal failure, or once the scheduler drops its receiver.
pub fn spawn_key_listener(tx: mpsc::Sender<ScheduleEvent>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        if !crossterm::event::poll(Duration::from_millis(250)).unwrap_or(false) {
            if tx.is_closed() {
                break;
            }
            continue;
        }

        let event = match crossterm::event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(ScheduleEvent::Quit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(ScheduleEvent::Quit)
                }
                _ => None,
            },
            Ok(Event::Resize(width, height)) => Some(ScheduleEvent::Resize { width, height }),
            Ok(_) => None,
            Err(_) => Some(ScheduleEvent::Quit),
        };

        if let Some(event) = event {
            let quit = event == ScheduleEvent::Quit;
            if tx.blocking_send(event).is_err() || quit {
                break;
            }
        }
    })
}

/// Maps Ctrl+C (the process termination signal) to a quit event. Used in
/// stdout mode, where no raw-mode key listener is running.
pub fn spawn_signal_listener(tx: mpsc::Sender<ScheduleEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(ScheduleEvent::Quit).await;
        }
    })
}
