// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate config, resolve n_skill    (Layer 2)
//   Step 2: Read train.csv / val.csv             (Layer 4 - data)
//   Step 3: Encode learners into fixed windows   (Layer 4 - data)
//   Step 4: Save config for evaluation           (Layer 6 - infra)
//   Step 5: Run training loop                    (Layer 5 - ml)
//
// Record files are the ones written by `prepare`:
//   <root>/<dataset>/train.csv
//   <root>/<dataset>/val.csv
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{dataset::KtDataset, encoder::SequenceEncoder, record_file::RecordFile};
use crate::domain::error::KtError;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::ModelKind;
use crate::ml::trainer::{run_training, ComputeDevice, TrainingSummary};

/// Skill vocabulary size of the ASSISTments logs.
pub const ASSISTMENTS_N_SKILL: usize = 124;
/// Skill vocabulary size of the riid log.
pub const RIID_N_SKILL: usize = 13523;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoints so `evaluate` can rebuild the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub root:           String,
    pub dataset:        String,
    pub model:          ModelKind,
    /// Skill vocabulary size; looked up from `dataset` when unset
    pub n_skill:        Option<usize>,
    pub max_seq:        usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub embed_dim:      usize,
    pub hidden_dim:     usize,
    pub num_heads:      usize,
    pub dropout:        f64,
    pub device:         ComputeDevice,
    pub checkpoint_dir: String,
    pub seed:           Option<u64>,
    pub num_workers:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            root:           "data".to_string(),
            dataset:        "assistments2009".to_string(),
            model:          ModelKind::Dkt,
            n_skill:        None,
            max_seq:        100,
            batch_size:     64,
            epochs:         50,
            lr:             1e-3,
            embed_dim:      128,
            hidden_dim:     128,
            num_heads:      8,
            dropout:        0.2,
            device:         ComputeDevice::Cpu,
            checkpoint_dir: "checkpoints".to_string(),
            seed:           None,
            num_workers:    1,
        }
    }
}

impl TrainConfig {
    /// Explicit `n_skill`, or the known size for the dataset name.
    pub fn resolve_n_skill(&self) -> Result<usize, KtError> {
        if let Some(n) = self.n_skill {
            return Ok(n);
        }
        let name = self.dataset.to_ascii_lowercase();
        if name.contains("assistments") {
            Ok(ASSISTMENTS_N_SKILL)
        } else if name.contains("riid") {
            Ok(RIID_N_SKILL)
        } else {
            Err(KtError::UnknownDataset(self.dataset.clone()))
        }
    }

    pub fn validate(&self) -> Result<(), KtError> {
        let invalid = |msg: String| Err(KtError::InvalidConfig(msg));

        if self.resolve_n_skill()? == 0 {
            return invalid("n_skill must be at least 1".to_string());
        }
        if self.max_seq < self.model.min_max_seq() {
            return invalid(format!(
                "max_seq must be at least {} for {}, got {}",
                self.model.min_max_seq(),
                self.model,
                self.max_seq
            ));
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1".to_string());
        }
        if self.epochs == 0 {
            return invalid("epochs must be at least 1".to_string());
        }
        if !(self.lr > 0.0) {
            return invalid(format!("lr must be positive, got {}", self.lr));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        if self.model == ModelKind::Sakt && (self.num_heads == 0 || self.embed_dim % self.num_heads != 0) {
            return invalid(format!(
                "embed_dim ({}) must be divisible by num_heads ({})",
                self.embed_dim, self.num_heads
            ));
        }
        Ok(())
    }

    pub fn dataset_dir(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.dataset)
    }

    pub fn encoder(&self) -> Result<SequenceEncoder, KtError> {
        SequenceEncoder::new(self.resolve_n_skill()?, self.max_seq, self.model.encoder_variant())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        // ── Step 1: Validate and pin n_skill ──────────────────────────────────
        // The saved config carries the resolved value, so evaluation never
        // depends on the dataset-name lookup.
        self.config.validate()?;
        let cfg = TrainConfig {
            n_skill: Some(self.config.resolve_n_skill()?),
            ..self.config.clone()
        };

        // ── Step 2 + 3: Read and encode both record files ─────────────────────
        let encoder   = cfg.encoder()?;
        let dir       = cfg.dataset_dir();
        let train_src = RecordFile::new(dir.join("train.csv"));
        let val_src   = RecordFile::new(dir.join("val.csv"));

        let train_dataset = KtDataset::load(&train_src, &encoder)
            .with_context(|| format!("Cannot build training set from '{}'", train_src.path().display()))?;
        let val_dataset = KtDataset::load(&val_src, &encoder)
            .with_context(|| format!("Cannot build validation set from '{}'", val_src.path().display()))?;

        tracing::info!(
            "Split: {} train, {} validation learners ({}, n_skill={}, max_seq={})",
            train_dataset.sample_count(),
            val_dataset.sample_count(),
            cfg.model,
            encoder.n_skill(),
            encoder.max_seq()
        );

        // ── Step 4: Save config for evaluation ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(&cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Per-epoch metrics go to '{}'", metrics.csv_path().display());

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(&cfg, train_dataset, val_dataset, &ckpt_manager, &metrics)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n_skill_lookup() {
        let cfg = |dataset: &str| TrainConfig { dataset: dataset.to_string(), ..TrainConfig::default() };

        assert_eq!(cfg("assistments2009").resolve_n_skill().unwrap(), 124);
        assert_eq!(cfg("ASSISTments2015").resolve_n_skill().unwrap(), 124);
        assert_eq!(cfg("riid").resolve_n_skill().unwrap(),            13523);
        assert_eq!(
            cfg("ednet").resolve_n_skill(),
            Err(KtError::UnknownDataset("ednet".to_string()))
        );

        let explicit = TrainConfig { n_skill: Some(7), ..cfg("ednet") };
        assert_eq!(explicit.resolve_n_skill().unwrap(), 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(TrainConfig::default().validate().is_ok());

        let short = TrainConfig { max_seq: 2, ..TrainConfig::default() };
        assert!(matches!(short.validate(), Err(KtError::InvalidConfig(_))));

        let sakt_short = TrainConfig { max_seq: 2, model: ModelKind::Sakt, ..TrainConfig::default() };
        assert!(sakt_short.validate().is_ok());

        let heads = TrainConfig { model: ModelKind::Sakt, embed_dim: 10, num_heads: 3, ..TrainConfig::default() };
        assert!(heads.validate().is_err());

        let zero_batch = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(zero_batch.validate().is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{ "model": "sakt", "epochs": 3 }"#).unwrap();
        assert_eq!(cfg.model,      ModelKind::Sakt);
        assert_eq!(cfg.epochs,     3);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.device,     ComputeDevice::Cpu);
    }

    #[test]
    fn test_execute_trains_from_record_files() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();

        let dir = data.path().join("xkl");
        std::fs::create_dir_all(&dir).unwrap();
        let record = |id: i64, flip: i64| {
            let skills: Vec<String> = (0..5).map(|k| ((id + k) % 4).to_string()).collect();
            let marks:  Vec<String> = (0..5).map(|k| ((id + k + flip) % 2).to_string()).collect();
            format!("{id}\n{}\n{}\n", skills.join(","), marks.join(","))
        };
        let train: String = (0..6).map(|i| record(i, 0)).collect();
        let val:   String = (6..10).map(|i| record(i, 1)).collect();
        std::fs::write(dir.join("train.csv"), train).unwrap();
        std::fs::write(dir.join("val.csv"),   val).unwrap();

        let cfg = TrainConfig {
            root:           data.path().to_string_lossy().into_owned(),
            dataset:        "xkl".to_string(),
            n_skill:        Some(4),
            max_seq:        5,
            batch_size:     2,
            epochs:         1,
            embed_dim:      4,
            hidden_dim:     4,
            seed:           Some(1),
            checkpoint_dir: ckpt.path().to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };

        let summary = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(summary.last.epoch, 1);

        let saved = CheckpointManager::new(ckpt.path()).unwrap().load_config().unwrap();
        assert_eq!(saved.n_skill, Some(4));
        assert_eq!(saved.dataset, "xkl");
    }
}
