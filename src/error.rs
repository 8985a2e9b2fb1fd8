//! Error taxonomy for metric sampling.
//!
//! Everything here is recoverable within a single collection round: the
//! aggregator logs the error and leaves the affected snapshot fields at zero.
//! Initialization failures (terminal, event source) are not part of this
//! taxonomy; they surface as fatal `anyhow` errors before the loop starts.

use crate::collector::MetricKind;
use thiserror::Error;

/// A metric provider call failed or returned unusable data.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The underlying OS query failed. The reason is an opaque message;
    /// callers do not distinguish failure subtypes.
    #[error("failed to read {kind} metric: {reason}")]
    Unavailable { kind: MetricKind, reason: String },

    /// The call succeeded but produced an empty or degenerate result,
    /// e.g. a percentage set with no entries.
    #[error("no {0} data returned")]
    NoData(MetricKind),

    /// The sample did not arrive before the round's collection deadline.
    #[error("{0} sample timed out")]
    Timeout(MetricKind),
}

impl ProviderError {
    pub fn unavailable(kind: MetricKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind,
            reason: reason.into(),
        }
    }
}
