//! Fan-in of metric samples into a single snapshot.
//!
//! The aggregator consumes samples in arrival order and terminates on count,
//! not kind: a duplicate-kind or missing-kind bug shows up as a short read on
//! the channel (or the round deadline firing), never as a hang. It never
//! returns an error; the worst outcome of a failed sample is a zeroed field
//! and a warning in the log.

use crate::collector::{MetricKind, MetricSample, MetricValue, METRIC_COUNT};
use crate::error::ProviderError;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Fixed divisor for byte-to-gigabyte conversion.
pub const BYTES_PER_GB: f64 = (1024u64 * 1024 * 1024) as f64;

/// Merged result of one collection round. Immutable once built; a zero field
/// means the reading was unavailable this round.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    pub disk_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    /// Which volume the disk figures describe.
    pub disk_path: String,
}

impl Snapshot {
    fn merge(&mut self, value: MetricValue) {
        match value {
            MetricValue::Cpu(percent) => {
                self.cpu_percent = percent;
            }
            MetricValue::Memory(info) => {
                self.memory_percent = info.used_percent;
                self.memory_used_gb = info.used_bytes as f64 / BYTES_PER_GB;
                self.memory_total_gb = info.total_bytes as f64 / BYTES_PER_GB;
            }
            MetricValue::Disk(info) => {
                self.disk_percent = info.used_percent;
                self.disk_used_gb = info.used_bytes as f64 / BYTES_PER_GB;
                self.disk_total_gb = info.total_bytes as f64 / BYTES_PER_GB;
            }
        }
    }
}

/// Consumes up to [`METRIC_COUNT`] samples and merges them into one snapshot.
///
/// `collect_timeout` bounds the whole wait: kinds still missing when the
/// deadline fires are logged as timed out and left at zero, so a wedged
/// provider call degrades one metric instead of stalling every future round.
pub async fn aggregate(
    samples: &mut mpsc::Receiver<MetricSample>,
    disk_path: &str,
    collect_timeout: Duration,
) -> Snapshot {
    let mut snapshot = Snapshot {
        disk_path: disk_path.to_string(),
        ..Snapshot::default()
    };
    let deadline = Instant::now() + collect_timeout;
    let mut seen: HashSet<MetricKind> = HashSet::with_capacity(METRIC_COUNT);

    for _ in 0..METRIC_COUNT {
        let sample = match tokio::time::timeout_at(deadline, samples.recv()).await {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                tracing::warn!("sample stream closed before the round completed");
                break;
            }
            Err(_) => {
                for kind in MetricKind::ALL {
                    if !seen.contains(&kind) {
                        let err = ProviderError::Timeout(kind);
                        tracing::warn!(kind = %kind, error = %err, "metric sample failed");
                    }
                }
                break;
            }
        };

        seen.insert(sample.kind);
        match sample.value {
            Ok(value) => snapshot.merge(value),
            Err(err) => {
                tracing::warn!(kind = %sample.kind, error = %err, "metric sample failed");
            }
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{DiskInfo, MemoryInfo};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn cpu_sample(percent: f64) -> MetricSample {
        MetricSample {
            kind: MetricKind::Cpu,
            value: Ok(MetricValue::Cpu(percent)),
        }
    }

    fn memory_sample(used: u64, total: u64, percent: f64) -> MetricSample {
        MetricSample {
            kind: MetricKind::Memory,
            value: Ok(MetricValue::Memory(MemoryInfo {
                used_percent: percent,
                used_bytes: used,
                total_bytes: total,
            })),
        }
    }

    fn disk_sample(used: u64, total: u64, percent: f64) -> MetricSample {
        MetricSample {
            kind: MetricKind::Disk,
            value: Ok(MetricValue::Disk(DiskInfo {
                used_percent: percent,
                used_bytes: used,
                total_bytes: total,
            })),
        }
    }

    fn error_sample(kind: MetricKind) -> MetricSample {
        MetricSample {
            kind,
            value: Err(ProviderError::unavailable(kind, "injected failure")),
        }
    }

    const GB: u64 = 1024 * 1024 * 1024;

    async fn aggregate_samples(samples: Vec<MetricSample>) -> Snapshot {
        let (tx, mut rx) = mpsc::channel(METRIC_COUNT);
        for sample in samples {
            tx.send(sample).await.unwrap();
        }
        drop(tx);
        aggregate(&mut rx, "/", TIMEOUT).await
    }

    #[tokio::test]
    async fn all_metrics_succeed() {
        let snapshot = aggregate_samples(vec![
            cpu_sample(75.5),
            memory_sample(8 * GB, 16 * GB, 60.0),
            disk_sample(450 * GB, 1000 * GB, 45.0),
        ])
        .await;

        assert_eq!(snapshot.cpu_percent, 75.5);
        assert_eq!(snapshot.memory_percent, 60.0);
        assert_eq!(snapshot.memory_used_gb, 8.0);
        assert_eq!(snapshot.memory_total_gb, 16.0);
        assert_eq!(snapshot.disk_percent, 45.0);
        assert_eq!(snapshot.disk_used_gb, 450.0);
        assert_eq!(snapshot.disk_total_gb, 1000.0);
        assert_eq!(snapshot.disk_path, "/");
    }

    #[tokio::test]
    async fn byte_to_gigabyte_conversion_is_exact() {
        let snapshot =
            aggregate_samples(vec![memory_sample(8 * GB, 16 * GB, 50.0)]).await;
        assert_eq!(snapshot.memory_used_gb, 8.0);
        assert_eq!(snapshot.memory_total_gb, 16.0);
    }

    #[tokio::test]
    async fn arrival_order_does_not_matter() {
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut results = Vec::new();
        for order in orders {
            let samples: Vec<MetricSample> = order
                .iter()
                .map(|&i| match i {
                    0 => cpu_sample(75.5),
                    1 => memory_sample(8 * GB, 16 * GB, 60.0),
                    _ => disk_sample(450 * GB, 1000 * GB, 45.0),
                })
                .collect();
            results.push(aggregate_samples(samples).await);
        }
        for pair in results.windows(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn every_failure_combination_zeroes_only_failed_fields() {
        for mask in 0u8..8 {
            let cpu_ok = mask & 1 != 0;
            let mem_ok = mask & 2 != 0;
            let disk_ok = mask & 4 != 0;

            let samples = vec![
                if cpu_ok {
                    cpu_sample(75.5)
                } else {
                    error_sample(MetricKind::Cpu)
                },
                if mem_ok {
                    memory_sample(8 * GB, 16 * GB, 60.0)
                } else {
                    error_sample(MetricKind::Memory)
                },
                if disk_ok {
                    disk_sample(450 * GB, 1000 * GB, 45.0)
                } else {
                    error_sample(MetricKind::Disk)
                },
            ];
            let snapshot = aggregate_samples(samples).await;

            assert_eq!(snapshot.cpu_percent, if cpu_ok { 75.5 } else { 0.0 });
            assert_eq!(snapshot.memory_percent, if mem_ok { 60.0 } else { 0.0 });
            assert_eq!(snapshot.memory_used_gb, if mem_ok { 8.0 } else { 0.0 });
            assert_eq!(snapshot.disk_percent, if disk_ok { 45.0 } else { 0.0 });
            assert_eq!(snapshot.disk_total_gb, if disk_ok { 1000.0 } else { 0.0 });
        }
    }

    #[tokio::test]
    async fn no_data_error_yields_zero_without_crash() {
        let snapshot = aggregate_samples(vec![
            MetricSample {
                kind: MetricKind::Cpu,
                value: Err(ProviderError::NoData(MetricKind::Cpu)),
            },
            memory_sample(8 * GB, 16 * GB, 60.0),
            disk_sample(450 * GB, 1000 * GB, 45.0),
        ])
        .await;
        assert_eq!(snapshot.cpu_percent, 0.0);
        assert_eq!(snapshot.memory_percent, 60.0);
    }

    #[tokio::test]
    async fn closed_stream_ends_the_round_early() {
        let snapshot = aggregate_samples(vec![cpu_sample(75.5)]).await;
        assert_eq!(snapshot.cpu_percent, 75.5);
        assert_eq!(snapshot.memory_percent, 0.0);
        assert_eq!(snapshot.disk_percent, 0.0);
    }

    #[tokio::test]
    async fn missing_sample_times_out_instead_of_hanging() {
        let (tx, mut rx) = mpsc::channel(METRIC_COUNT);
        tx.send(cpu_sample(75.5)).await.unwrap();
        tx.send(memory_sample(8 * GB, 16 * GB, 60.0)).await.unwrap();
        // Keep tx alive so the channel never closes; the disk sample never comes.
        let snapshot = aggregate(&mut rx, "/", Duration::from_millis(50)).await;
        drop(tx);

        assert_eq!(snapshot.cpu_percent, 75.5);
        assert_eq!(snapshot.memory_percent, 60.0);
        assert_eq!(snapshot.disk_percent, 0.0);
    }
}
