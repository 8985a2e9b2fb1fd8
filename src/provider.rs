//! Metric providers: the capability set the collector fans out against.
//!
//! [`SystemProvider`] reads `/proc/stat`, `/proc/meminfo`, and `statvfs(3)`
//! directly. The calls block (CPU sampling sleeps for the whole sample
//! duration), so the collector runs each one on the blocking thread pool.

use crate::collector::MetricKind;
use crate::error::ProviderError;
use std::fs;
use std::time::Duration;

/// Normalized memory reading. `used_bytes <= total_bytes` is guaranteed by
/// the provider, not checked downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryInfo {
    pub used_percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Normalized disk usage reading for a single volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskInfo {
    pub used_percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Capability set for raw hardware readings.
///
/// Implementations must be cheap to share across the three concurrent
/// sampling units; state needed between calls belongs behind interior
/// mutability.
pub trait MetricProvider: Send + Sync + 'static {
    /// Overall CPU utilization (0-100) measured over `sample_duration`.
    fn cpu_percent(&self, sample_duration: Duration) -> Result<f64, ProviderError>;

    /// Current memory usage.
    fn memory_info(&self) -> Result<MemoryInfo, ProviderError>;

    /// Usage of the volume containing `path`.
    fn disk_info(&self, path: &str) -> Result<DiskInfo, ProviderError>;
}

/// Aggregate CPU time counters from the `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CpuTimes {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    iowait: u64,
    irq: u64,
    softirq: u64,
    steal: u64,
}

impl CpuTimes {
    fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Production provider backed by procfs and statvfs.
#[derive(Debug, Default)]
pub struct SystemProvider;

impl SystemProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_cpu_times(&self) -> Result<CpuTimes, ProviderError> {
        let stat = fs::read_to_string("/proc/stat")
            .map_err(|e| ProviderError::unavailable(MetricKind::Cpu, e.to_string()))?;
        parse_cpu_times(&stat)
    }
}

impl MetricProvider for SystemProvider {
    fn cpu_percent(&self, sample_duration: Duration) -> Result<f64, ProviderError> {
        // Utilization is the active share of the counter deltas between two
        // snapshots taken sample_duration apart.
        let before = self.read_cpu_times()?;
        std::thread::sleep(sample_duration);
        let after = self.read_cpu_times()?;

        let total_delta = after.total().saturating_sub(before.total());
        if total_delta == 0 {
            return Ok(0.0);
        }
        let idle_delta = after.idle_total().saturating_sub(before.idle_total());
        Ok(100.0 * (1.0 - idle_delta as f64 / total_delta as f64))
    }

    fn memory_info(&self) -> Result<MemoryInfo, ProviderError> {
        let meminfo = fs::read_to_string("/proc/meminfo")
            .map_err(|e| ProviderError::unavailable(MetricKind::Memory, e.to_string()))?;
        parse_meminfo(&meminfo)
    }

    fn disk_info(&self, path: &str) -> Result<DiskInfo, ProviderError> {
        statvfs_disk_info(path)
    }
}

fn parse_cpu_times(stat: &str) -> Result<CpuTimes, ProviderError> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or(ProviderError::NoData(MetricKind::Cpu))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|s| s.parse().ok())
        .collect();
    if fields.is_empty() {
        return Err(ProviderError::NoData(MetricKind::Cpu));
    }

    Ok(CpuTimes {
        user: *fields.first().unwrap_or(&0),
        nice: *fields.get(1).unwrap_or(&0),
        system: *fields.get(2).unwrap_or(&0),
        idle: *fields.get(3).unwrap_or(&0),
        iowait: *fields.get(4).unwrap_or(&0),
        irq: *fields.get(5).unwrap_or(&0),
        softirq: *fields.get(6).unwrap_or(&0),
        steal: *fields.get(7).unwrap_or(&0),
    })
}

fn parse_meminfo(meminfo: &str) -> Result<MemoryInfo, ProviderError> {
    let mut total: u64 = 0;
    let mut free: u64 = 0;
    let mut buffers: u64 = 0;
    let mut cached: u64 = 0;

    for line in meminfo.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        // Values are reported in kB.
        let value: u64 = parts[1].parse().unwrap_or(0) * 1024;
        match parts[0] {
            "MemTotal:" => total = value,
            "MemFree:" => free = value,
            "Buffers:" => buffers = value,
            "Cached:" => cached = value,
            _ => {}
        }
    }

    if total == 0 {
        return Err(ProviderError::NoData(MetricKind::Memory));
    }

    let used = total.saturating_sub(free + buffers + cached);
    Ok(MemoryInfo {
        used_percent: 100.0 * used as f64 / total as f64,
        used_bytes: used,
        total_bytes: total,
    })
}

#[cfg(unix)]
fn statvfs_disk_info(path: &str) -> Result<DiskInfo, ProviderError> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let c_path = CString::new(path)
        .map_err(|_| ProviderError::unavailable(MetricKind::Disk, "path contains NUL"))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    let result = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if result != 0 {
        let err = std::io::Error::last_os_error();
        return Err(ProviderError::unavailable(
            MetricKind::Disk,
            format!("statvfs({}): {}", path, err),
        ));
    }

    let stat = unsafe { stat.assume_init() };
    let block_size = stat.f_frsize as u64;
    let total_bytes = stat.f_blocks as u64 * block_size;
    if total_bytes == 0 {
        return Err(ProviderError::NoData(MetricKind::Disk));
    }
    let free_bytes = stat.f_bfree as u64 * block_size;
    let used_bytes = total_bytes.saturating_sub(free_bytes);

    Ok(DiskInfo {
        used_percent: 100.0 * used_bytes as f64 / total_bytes as f64,
        used_bytes,
        total_bytes,
    })
}

#[cfg(not(unix))]
fn statvfs_disk_info(path: &str) -> Result<DiskInfo, ProviderError> {
    Err(ProviderError::unavailable(
        MetricKind::Disk,
        format!("disk usage for {} not supported on this platform", path),
    ))
}
