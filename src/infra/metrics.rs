// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each pass.
//
// Why log metrics to CSV?
//   - Easy to open in Excel or Google Sheets
//   - Can plot learning curves to diagnose training issues
//   - Provides a permanent record of each training run
//
// Metrics recorded per pass:
//   - epoch:      the pass number (1, 2, 3, ...)
//   - train_loss: mean cross-entropy loss on the training set
//   - eval_loss:  mean cross-entropy loss on the test set
//   - accuracy:   top-1 accuracy on the evaluated fraction
//
// Output file: checkpoints/metrics.csv
//
// How to read the metrics:
//   - Loss should decrease each pass (model is learning)
//   - If eval_loss rises while train_loss falls → overfitting
//   - Accuracy should increase each pass
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The pass number (starts at 1)
    pub epoch: usize,

    /// Mean cross-entropy loss over the executed training steps
    pub train_loss: f64,

    /// Mean cross-entropy loss over the evaluated test batches
    pub eval_loss: f64,

    /// Top-1 accuracy on the evaluated fraction, in [0, 1]
    pub accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, eval_loss: f64, accuracy: f64) -> Self {
        Self { epoch, train_loss, eval_loss, accuracy }
    }

    /// True if this pass improved over the previous best eval loss.
    pub fn is_improvement(&self, best_eval_loss: f64) -> bool {
        self.eval_loss < best_eval_loss
    }
}

/// Logs pass metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only for a fresh file — appending across runs
        // keeps one continuous record
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,eval_loss,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one pass's metrics as a new CSV row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.eval_loss, m.accuracy,
        )?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, eval_loss={:.4}",
            m.epoch, m.train_loss, m.eval_loss,
        );
        Ok(())
    }

    /// Path to the metrics CSV file.
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
