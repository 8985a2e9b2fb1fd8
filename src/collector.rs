//! Concurrent metric collection: one blocking task per metric kind.
//!
//! A collection round fans out exactly [`METRIC_COUNT`] provider calls and
//! hands back a bounded channel that will yield one [`MetricSample`] per kind
//! in arrival order. Failures are captured as values; nothing crosses the
//! task boundary as a panic, and the first failure never short-circuits the
//! other calls.

use crate::error::ProviderError;
use crate::provider::{DiskInfo, MemoryInfo, MetricProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Number of metric kinds sampled per round. The channel capacity below is
/// this exact count: a round can never produce more samples.
pub const METRIC_COUNT: usize = 3;

/// Identifies which hardware metric a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
}

impl MetricKind {
    pub const ALL: [MetricKind; METRIC_COUNT] =
        [MetricKind::Cpu, MetricKind::Memory, MetricKind::Disk];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Cpu => write!(f, "cpu"),
            MetricKind::Memory => write!(f, "memory"),
            MetricKind::Disk => write!(f, "disk"),
        }
    }
}

/// A successful provider reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Cpu(f64),
    Memory(MemoryInfo),
    Disk(DiskInfo),
}

/// Outcome of one provider call, success or failure, tagged with its kind.
/// Produced by the collector, consumed by the aggregator, then discarded.
#[derive(Debug)]
pub struct MetricSample {
    pub kind: MetricKind,
    pub value: Result<MetricValue, ProviderError>,
}

/// Fans out one concurrent provider call per metric kind.
pub struct Collector<P> {
    provider: Arc<P>,
    sample_duration: Duration,
    disk_path: String,
}

impl<P: MetricProvider> Collector<P> {
    pub fn new(provider: Arc<P>, sample_duration: Duration, disk_path: impl Into<String>) -> Self {
        Self {
            provider,
            sample_duration,
            disk_path: disk_path.into(),
        }
    }

    /// Starts one collection round and returns the sample stream.
    ///
    /// Each metric runs on the blocking pool (CPU sampling sleeps for the
    /// whole sample duration). Wall-clock cost of draining the stream is the
    /// max of the three call latencies, not their sum. A sample that arrives
    /// after the receiver is dropped is silently discarded.
    pub fn collect(&self) -> mpsc::Receiver<MetricSample> {
        let (tx, rx) = mpsc::channel(METRIC_COUNT);

        let provider = self.provider.clone();
        let sample_duration = self.sample_duration;
        let cpu_tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let value = provider.cpu_percent(sample_duration).map(MetricValue::Cpu);
            let _ = cpu_tx.blocking_send(MetricSample {
                kind: MetricKind::Cpu,
                value,
            });
        });

        let provider = self.provider.clone();
        let mem_tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let value = provider.memory_info().map(MetricValue::Memory);
            let _ = mem_tx.blocking_send(MetricSample {
                kind: MetricKind::Memory,
                value,
            });
        });

        let provider = self.provider.clone();
        let disk_path = self.disk_path.clone();
        tokio::task::spawn_blocking(move || {
            let value = provider.disk_info(&disk_path).map(MetricValue::Disk);
            let _ = tx.blocking_send(MetricSample {
                kind: MetricKind::Disk,
                value,
            });
        });

        rx
    }
}
