// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on a record file:
//
//   1. Load train_config.json from the checkpoint dir
//   2. Encode the record file with the same encoder settings
//   3. Rebuild the model, load the latest weights, one eval pass
//
// With no explicit record file, the validation file written by
// `prepare` for the trained dataset is used.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::{dataset::KtDataset, record_file::RecordFile};
use crate::domain::scoring::PassStats;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::{run_evaluation, ComputeDevice};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    records:        Option<PathBuf>,
    device:         Option<ComputeDevice>,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: String, records: Option<PathBuf>, device: Option<ComputeDevice>) -> Self {
        Self { checkpoint_dir, records, device }
    }

    pub fn execute(&self) -> Result<PassStats> {
        let ckpt    = CheckpointManager::new(&self.checkpoint_dir)?;
        let mut cfg = ckpt.load_config()?;
        if let Some(device) = self.device {
            cfg.device = device;
        }

        let path = self
            .records
            .clone()
            .unwrap_or_else(|| cfg.dataset_dir().join("val.csv"));
        let source = RecordFile::new(&path);

        let dataset = KtDataset::load(&source, &cfg.encoder()?)
            .with_context(|| format!("Cannot build evaluation set from '{}'", path.display()))?;
        tracing::info!(
            "Evaluating {} on {} learners from '{}'",
            cfg.model,
            dataset.sample_count(),
            path.display()
        );

        run_evaluation(&cfg, dataset, &ckpt)
    }
}
