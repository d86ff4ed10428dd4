// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per epoch to checkpoints/metrics.csv.
//
// Columns:
//   epoch, train_loss, train_acc, train_auc, val_loss, val_acc, val_auc
//
// Example:
//   epoch,train_loss,train_acc,train_auc,val_loss,val_acc,val_auc
//   1,0.612300,0.672000,0.701200,0.598100,0.688000,0.724500
//
// AUC is the number to watch for knowledge tracing; accuracy is
// dominated by the majority class on most datasets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::scoring::PassStats;

/// One row of metrics data for a single training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    pub train_auc:  f64,
    pub val_loss:   f64,
    pub val_acc:    f64,
    pub val_auc:    f64,
}

impl EpochMetrics {
    pub fn from_passes(epoch: usize, train: &PassStats, val: &PassStats) -> Self {
        Self {
            epoch,
            train_loss: train.mean_loss,
            train_acc:  train.accuracy,
            train_auc:  train.auc,
            val_loss:   val.mean_loss,
            val_acc:    val.accuracy,
            val_auc:    val.auc,
        }
    }

    /// True if this epoch's validation AUC beats the previous best.
    pub fn is_improvement(&self, best_val_auc: f64) -> bool {
        self.val_auc > best_val_auc
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to one log.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,train_acc,train_auc,val_loss,val_acc,val_auc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.train_auc,
            m.val_loss,
            m.val_acc,
            m.val_auc,
        )?;

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
