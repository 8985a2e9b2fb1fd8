//! Snapshot logging to a JSON Lines file.

use crate::aggregator::Snapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One logged collection round.
#[derive(Debug, Serialize)]
struct SnapshotRecord<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
}

/// Appends one JSON line per collection round to a log file.
pub struct SnapshotLogger {
    writer: BufWriter<File>,
    rounds_written: u64,
}

impl SnapshotLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())
            .context("Failed to create snapshot log file")?;

        Ok(Self {
            writer: BufWriter::new(file),
            rounds_written: 0,
        })
    }

    pub fn log(&mut self, snapshot: &Snapshot) -> Result<()> {
        let record = SnapshotRecord {
            timestamp: Utc::now(),
            snapshot,
        };
        let json = serde_json::to_string(&record)?;
        writeln!(self.writer, "{}", json)?;
        self.rounds_written += 1;

        // Flush every 10 rounds to bound data loss on crash
        if self.rounds_written % 10 == 0 {
            self.writer.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rounds_written(&self) -> u64 {
        self.rounds_written
    }
}

impl Drop for SnapshotLogger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
