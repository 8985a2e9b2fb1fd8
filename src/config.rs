//! Immutable runtime configuration.
//!
//! Built once from CLI arguments and passed by value into the scheduler and
//! collector; nothing in the crate holds mutable global settings.

use std::time::Duration;

/// Default volume to sample when `--disk` is not given.
#[cfg(windows)]
pub const DEFAULT_DISK_PATH: &str = "C:\\";
#[cfg(not(windows))]
pub const DEFAULT_DISK_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Cadence of the scheduler's periodic tick.
    pub refresh_interval: Duration,
    /// Sub-interval the CPU provider measures over. Should stay well below
    /// the refresh interval so a round fits inside a tick.
    pub sample_duration: Duration,
    /// Deadline for one whole collection round; samples missing at the
    /// deadline count as failed.
    pub collect_timeout: Duration,
    /// Volume whose usage the disk metric reports.
    pub disk_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(1),
            sample_duration: Duration::from_millis(100),
            collect_timeout: Duration::from_secs(5),
            disk_path: DEFAULT_DISK_PATH.to_string(),
        }
    }
}
