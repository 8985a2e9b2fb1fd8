// Shared test doubles for the collection pipeline.

#![allow(dead_code)]

use hwtop::collector::MetricKind;
use hwtop::error::ProviderError;
use hwtop::provider::{DiskInfo, MemoryInfo, MetricProvider};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

pub const GB: u64 = 1024 * 1024 * 1024;

/// Shared in-memory sink for tracing output, so tests can assert on the
/// warning lines a degraded round emits.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Installs a warn-level subscriber writing into a [`LogCapture`] for the
/// current thread. The returned guard must stay alive for the duration of the
/// test, and the test must run on a current-thread runtime so the aggregation
/// happens where the subscriber is installed.
pub fn capture_warnings() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// Fixed-value provider. `None` readings fail as unavailable; `cpu_no_data`
/// simulates a call that succeeds but produces an empty result set.
pub struct FakeProvider {
    pub cpu: Option<f64>,
    pub memory: Option<MemoryInfo>,
    pub disk: Option<DiskInfo>,
    pub cpu_no_data: bool,
    pub cpu_latency: Duration,
    pub memory_latency: Duration,
    pub disk_latency: Duration,
}

impl FakeProvider {
    /// All three metrics succeed with the reference readings:
    /// CPU 75.5%, memory 8/16 GB at 60%, disk 450/1000 GB at 45%.
    pub fn healthy() -> Self {
        Self {
            cpu: Some(75.5),
            memory: Some(MemoryInfo {
                used_percent: 60.0,
                used_bytes: 8 * GB,
                total_bytes: 16 * GB,
            }),
            disk: Some(DiskInfo {
                used_percent: 45.0,
                used_bytes: 450 * GB,
                total_bytes: 1000 * GB,
            }),
            cpu_no_data: false,
            cpu_latency: Duration::ZERO,
            memory_latency: Duration::ZERO,
            disk_latency: Duration::ZERO,
        }
    }

    pub fn with_latencies(cpu: Duration, memory: Duration, disk: Duration) -> Self {
        Self {
            cpu_latency: cpu,
            memory_latency: memory,
            disk_latency: disk,
            ..Self::healthy()
        }
    }
}

impl MetricProvider for FakeProvider {
    fn cpu_percent(&self, _sample_duration: Duration) -> Result<f64, ProviderError> {
        std::thread::sleep(self.cpu_latency);
        if self.cpu_no_data {
            return Err(ProviderError::NoData(MetricKind::Cpu));
        }
        self.cpu
            .ok_or_else(|| ProviderError::unavailable(MetricKind::Cpu, "cpu query failed"))
    }

    fn memory_info(&self) -> Result<MemoryInfo, ProviderError> {
        std::thread::sleep(self.memory_latency);
        self.memory
            .ok_or_else(|| ProviderError::unavailable(MetricKind::Memory, "memory query failed"))
    }

    fn disk_info(&self, _path: &str) -> Result<DiskInfo, ProviderError> {
        std::thread::sleep(self.disk_latency);
        self.disk
            .ok_or_else(|| ProviderError::unavailable(MetricKind::Disk, "disk query failed"))
    }
}
