// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `prepare`, `train`, `evaluate`
// and all their configurable flags.
//
// Defaults match TrainConfig / PrepareConfig::default().
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{prepare_use_case::PrepareConfig, train_use_case::TrainConfig};
use crate::ml::{model::ModelKind, trainer::ComputeDevice};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a raw interaction log into skill/user lists and train/val record files
    Prepare(PrepareArgs),

    /// Train a knowledge tracing model on prepared record files
    Train(TrainArgs),

    /// Score the latest checkpoint on a record file
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// One of assistments2009, assistments2012, assistments2015, riid, xkl
    #[arg(long)]
    pub dataset: String,

    /// Raw CSV interaction log
    #[arg(long)]
    pub input: String,

    /// Outputs go to <root>/<dataset>/
    #[arg(long, default_value = "data")]
    pub root: String,

    /// Share of learners held out for validation
    #[arg(long, default_value_t = 0.3)]
    pub val_fraction: f64,

    /// Seed for the learner shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            root:         a.root,
            dataset:      a.dataset,
            input:        a.input,
            val_fraction: a.val_fraction,
            seed:         a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset name; record files are read from <root>/<dataset>/
    #[arg(long)]
    pub dataset: String,

    #[arg(long, default_value = "data")]
    pub root: String,

    /// dkt or sakt
    #[arg(long, default_value_t = ModelKind::Dkt)]
    pub model: ModelKind,

    /// Skill vocabulary size (looked up from the dataset name if omitted)
    #[arg(long)]
    pub n_skill: Option<usize>,

    /// Window length every learner history is padded / truncated to
    #[arg(long, default_value_t = 100)]
    pub max_seq: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 128)]
    pub embed_dim: usize,

    /// LSTM hidden size (dkt)
    #[arg(long, default_value_t = 128)]
    pub hidden_dim: usize,

    /// Attention heads (sakt); embed_dim must be divisible by it
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// cpu or wgpu
    #[arg(long, default_value_t = ComputeDevice::Cpu)]
    pub device: ComputeDevice,

    /// Directory for checkpoints, train_config.json and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Seed for the per-epoch shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            root:           a.root,
            dataset:        a.dataset,
            model:          a.model,
            n_skill:        a.n_skill,
            max_seq:        a.max_seq,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            embed_dim:      a.embed_dim,
            hidden_dim:     a.hidden_dim,
            num_heads:      a.num_heads,
            dropout:        a.dropout,
            device:         a.device,
            checkpoint_dir: a.checkpoint_dir,
            seed:           a.seed,
            num_workers:    a.num_workers,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Record file to score (defaults to the trained dataset's val.csv)
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Override the device stored in train_config.json
    #[arg(long)]
    pub device: Option<ComputeDevice>,
}
