//! Hardware monitor core: concurrent metric collection, partial-failure
//! aggregation, and the refresh/event scheduling loop.
//!
//! Raw OS readings come from a [`provider::MetricProvider`]; rendering goes
//! through a [`ui::Presenter`]. Both are trait seams so tests can substitute
//! fixed-value doubles for the real `/proc`-backed implementations.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod ui;

pub use aggregator::Snapshot;
pub use collector::{Collector, MetricKind, MetricSample, MetricValue};
pub use config::MonitorConfig;
pub use error::ProviderError;
pub use provider::{DiskInfo, MemoryInfo, MetricProvider, SystemProvider};
pub use scheduler::{ScheduleEvent, Scheduler, SchedulerState};
