// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backends:
//   --device cpu   → Autodiff<NdArray> for training, NdArray for validation
//   --device wgpu  → Autodiff<Wgpu>    for training, Wgpu    for validation
//
//   - model.valid() returns the model on the inner backend with
//     dropout disabled, so validation batches use the inner backend too
//   - the train loader reshuffles on every epoch (seeded)
//
// Per epoch:
//   train pass → validation pass → stdout summary
//   → metrics.csv row → checkpoint
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::AdamConfig,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::KtBatcher, dataset::KtDataset};
use crate::domain::error::KtError;
use crate::domain::scoring::PassStats;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::dkt::{DktConfig, DktModel};
use crate::ml::evaluation::{EvaluationLoop, TracingObserver};
use crate::ml::model::{KnowledgeTracingModel, ModelKind};
use crate::ml::sakt::{SaktConfig, SaktModel};

/// Per-batch loss is logged (at debug) every this many batches.
const LOG_EVERY_N_BATCHES: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Wgpu,
}

impl FromStr for ComputeDevice {
    type Err = KtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu"  => Ok(ComputeDevice::Cpu),
            "wgpu" => Ok(ComputeDevice::Wgpu),
            other  => Err(KtError::InvalidConfig(format!(
                "unknown device '{other}', expected 'cpu' or 'wgpu'"
            ))),
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu  => f.write_str("cpu"),
            ComputeDevice::Wgpu => f.write_str("wgpu"),
        }
    }
}

/// Outcome of a full training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub last: EpochMetrics,
    pub best: EpochMetrics,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: KtDataset,
    val_dataset:   KtDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingSummary> {
    match cfg.device {
        ComputeDevice::Cpu => {
            let device = NdArrayDevice::default();
            tracing::info!("Using CPU device: {:?}", device);
            train_on::<Autodiff<NdArray>>(cfg, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
        ComputeDevice::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_on::<Autodiff<Wgpu>>(cfg, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
    }
}

/// Rebuild the model from `cfg`, load the latest checkpoint and run
/// one validation-mode pass over `dataset`.
pub fn run_evaluation(
    cfg:          &TrainConfig,
    dataset:      KtDataset,
    ckpt_manager: &CheckpointManager,
) -> Result<PassStats> {
    match cfg.device {
        ComputeDevice::Cpu  => evaluate_on::<NdArray>(cfg, dataset, ckpt_manager, NdArrayDevice::default()),
        ComputeDevice::Wgpu => evaluate_on::<Wgpu>(cfg, dataset, ckpt_manager, WgpuDevice::default()),
    }
}

pub fn dkt_config(cfg: &TrainConfig) -> Result<DktConfig, KtError> {
    Ok(DktConfig::new(cfg.resolve_n_skill()?)
        .with_embed_dim(cfg.embed_dim)
        .with_hidden_dim(cfg.hidden_dim)
        .with_dropout(cfg.dropout))
}

pub fn sakt_config(cfg: &TrainConfig) -> Result<SaktConfig, KtError> {
    Ok(SaktConfig::new(cfg.resolve_n_skill()?, cfg.max_seq - 1)
        .with_embed_dim(cfg.embed_dim)
        .with_num_heads(cfg.num_heads)
        .with_dropout(cfg.dropout))
}

fn train_on<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: KtDataset,
    val_dataset:   KtDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingSummary> {
    match cfg.model {
        ModelKind::Dkt => {
            let model: DktModel<B> = dkt_config(cfg)?.init(&device);
            tracing::info!("Model ready: dkt, embed_dim={}, hidden_dim={}", cfg.embed_dim, cfg.hidden_dim);
            fit(cfg, model, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
        ModelKind::Sakt => {
            let model: SaktModel<B> = sakt_config(cfg)?.init(&device);
            tracing::info!("Model ready: sakt, embed_dim={}, num_heads={}", cfg.embed_dim, cfg.num_heads);
            fit(cfg, model, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
    }
}

fn fit<B, M>(
    cfg:           &TrainConfig,
    mut model:     M,
    train_dataset: KtDataset,
    val_dataset:   KtDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + KnowledgeTracingModel<B>,
    M::InnerModule: KnowledgeTracingModel<B::InnerBackend>,
{
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().init::<B, M>();

    let train_loader = DataLoaderBuilder::new(KtBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed.unwrap_or(42))
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(KtBatcher::<B::InnerBackend>::new(device))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(val_dataset);

    let looper       = EvaluationLoop::for_model(cfg.model);
    let mut observer = TracingObserver::new(LOG_EVERY_N_BATCHES);
    let mut last: Option<EpochMetrics> = None;
    let mut best: Option<EpochMetrics> = None;

    for epoch in 1..=cfg.epochs {
        let (trained, train_stats) =
            looper.train_pass(model, &mut optim, cfg.lr, train_loader.iter(), &mut observer)?;
        model = trained;

        let model_valid = model.valid();
        let val_stats   = looper.eval_pass(&model_valid, val_loader.iter(), &mut observer)?;

        println!(
            "epoch - {} train_loss - {:.2} acc - {:.3} auc - {:.3}",
            epoch, train_stats.mean_loss, train_stats.accuracy, train_stats.auc,
        );
        println!(
            "epoch - {} vall_loss - {:.2} acc - {:.3} auc - {:.3}",
            epoch, val_stats.mean_loss, val_stats.accuracy, val_stats.auc,
        );

        let row = EpochMetrics::from_passes(epoch, &train_stats, &val_stats);
        metrics.log(&row)?;
        ckpt_manager.save_model(&model_valid, epoch)?;

        if best.as_ref().map_or(true, |b| row.is_improvement(b.val_auc)) {
            tracing::info!("New best val_auc={:.4} at epoch {}", row.val_auc, epoch);
            best = Some(row.clone());
        }
        last = Some(row);
    }

    tracing::info!("Training complete!");
    match (last, best) {
        (Some(last), Some(best)) => Ok(TrainingSummary { last, best }),
        _ => Err(KtError::InvalidConfig("epochs must be at least 1".to_string()).into()),
    }
}

fn evaluate_on<B: Backend>(
    cfg:          &TrainConfig,
    dataset:      KtDataset,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<PassStats> {
    let loader = DataLoaderBuilder::new(KtBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(dataset);

    let looper       = EvaluationLoop::for_model(cfg.model);
    let mut observer = TracingObserver::new(LOG_EVERY_N_BATCHES);

    match cfg.model {
        ModelKind::Dkt => {
            let model: DktModel<B> = dkt_config(cfg)?.init(&device);
            let model = ckpt_manager.load_model(model, &device)?;
            looper.eval_pass(&model, loader.iter(), &mut observer)
        }
        ModelKind::Sakt => {
            let model: SaktModel<B> = sakt_config(cfg)?.init(&device);
            let model = ckpt_manager.load_model(model, &device)?;
            looper.eval_pass(&model, loader.iter(), &mut observer)
        }
    }
}
