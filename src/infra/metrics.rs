// ============================================================
// Layer 6 — Batch Metrics Logger
// ============================================================
// Appends one CSV row per attempted batch so the acceptance
// rate of a generator can be followed across runs.
//
// Output file: <corpus_dir>/batch_metrics.csv
//
//   batch,start_slot,requested,accepted,rejected,outcome
//   1,1,5,5,0,committed
//   2,6,5,3,2,committed
//   3,9,5,0,0,abandoned
//
// `outcome` is `committed` when the batch reached the store
// (even with zero accepted forms) and `abandoned` when the
// generator failed before any form was validated.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "batch,start_slot,requested,accepted,rejected,outcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Committed,
    Abandoned,
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Committed => "committed",
            Self::Abandoned => "abandoned",
        })
    }
}

/// One row of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// 1-based batch number within this run.
    pub batch:      usize,
    pub start_slot: u64,
    pub requested:  usize,
    pub accepted:   usize,
    pub rejected:   usize,
    pub outcome:    BatchOutcome,
}

impl BatchMetrics {
    pub fn abandoned(batch: usize, start_slot: u64, requested: usize) -> Self {
        Self { batch, start_slot, requested, accepted: 0, rejected: 0, outcome: BatchOutcome::Abandoned }
    }

    /// Accepted share of the forms the generator returned.
    pub fn acceptance_rate(&self) -> f64 {
        let seen = self.accepted + self.rejected;
        if seen == 0 {
            0.0
        } else {
            self.accepted as f64 / seen as f64
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or start) the log at `csv_path`, writing the header
    /// only when the file is new.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{}", HEADER)?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &BatchMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{},{},{}",
            m.batch, m.start_slot, m.requested, m.accepted, m.rejected, m.outcome,
        )?;

        tracing::debug!(
            "Logged batch {}: {}/{} accepted ({})",
            m.batch,
            m.accepted,
            m.requested,
            m.outcome,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acceptance_rate() {
        let m = BatchMetrics {
            batch: 1, start_slot: 1, requested: 5, accepted: 3, rejected: 1,
            outcome: BatchOutcome::Committed,
        };
        assert_eq!(m.acceptance_rate(), 0.75);
        assert_eq!(BatchMetrics::abandoned(2, 6, 5).acceptance_rate(), 0.0);
    }

    #[test]
    fn test_rows_append_under_one_header() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("batch_metrics.csv");

        let logger = MetricsLogger::new(&path).unwrap();
        logger
            .log(&BatchMetrics {
                batch: 1, start_slot: 1, requested: 5, accepted: 4, rejected: 1,
                outcome: BatchOutcome::Committed,
            })
            .unwrap();

        // A second run reopens the same file.
        MetricsLogger::new(&path).unwrap().log(&BatchMetrics::abandoned(1, 6, 5)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,1,5,4,1,committed", "1,6,5,0,0,abandoned"]);
    }
}
