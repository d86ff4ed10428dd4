// ============================================================
// Layer 5 — Evaluation Loop
// ============================================================
// One pass (epoch) over a batched dataset, in either mode:
//
//   train  forward → loss → backward → Adam step
//   eval   forward → loss
//
// Both modes share the per-batch work:
//
//   1. model.forward_scores(inputs, targets)
//   2. gather, depending on the model's output shape
//        TargetIndex  [N, n_skill] → score of the target skill [N, 1]
//        PerStep      [N, T]       → used as is
//   3. binary cross-entropy against the labels (with logits
//      or on probabilities, per ScoreKind)
//   4. the FINAL column of scores / labels is pulled back to
//      the host and fed to the PassAccumulator
//
// For PerStep models the loss covers every position but the
// metrics only score each learner's last interaction, so the
// two model families report comparable numbers.
//
// Burn optimisers are functional: gradients are produced fresh
// by loss.backward() each step, so there is nothing to zero.
//
// Reference: Burn Book §5 (Training), Kingma & Ba (2015) Adam

use anyhow::{anyhow, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::KtBatch;
use crate::domain::scoring::{PassAccumulator, PassStats, ScoreKind};
use crate::domain::traits::{PassMode, PassObserver};
use crate::ml::model::{KnowledgeTracingModel, ModelKind};

/// How raw model output is lined up with the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gather {
    /// Output has one column per skill; pick the target skill's column.
    TargetIndex,
    /// Output already has one column per target position.
    PerStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationLoop {
    pub gather:     Gather,
    pub score_kind: ScoreKind,
}

impl EvaluationLoop {
    pub fn new(gather: Gather, score_kind: ScoreKind) -> Self {
        Self { gather, score_kind }
    }

    pub fn for_model(kind: ModelKind) -> Self {
        Self::new(kind.gather(), kind.score_kind())
    }

    /// Run one training pass, returning the updated model and its statistics.
    pub fn train_pass<B, M, O>(
        &self,
        mut model: M,
        optim:     &mut O,
        lr:        f64,
        batches:   impl IntoIterator<Item = KtBatch<B>>,
        observer:  &mut dyn PassObserver,
    ) -> Result<(M, PassStats)>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + KnowledgeTracingModel<B>,
        O: Optimizer<M, B>,
    {
        let mut acc = PassAccumulator::new(self.score_kind);

        for (i, batch) in batches.into_iter().enumerate() {
            let (loss, scores, labels) = self.forward_batch(&model, batch);
            let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            let (labels, scores) = final_column(scores, labels)?;
            acc.record_batch(loss_value, &labels, &scores);
            observer.on_batch(PassMode::Train, i, loss_value);
        }

        let stats = acc.finish()?;
        observer.on_pass_end(PassMode::Train, &stats);
        Ok((model, stats))
    }

    /// Run one validation pass; the model is only read.
    pub fn eval_pass<B, M>(
        &self,
        model:    &M,
        batches:  impl IntoIterator<Item = KtBatch<B>>,
        observer: &mut dyn PassObserver,
    ) -> Result<PassStats>
    where
        B: Backend,
        M: KnowledgeTracingModel<B>,
    {
        let mut acc = PassAccumulator::new(self.score_kind);

        for (i, batch) in batches.into_iter().enumerate() {
            let (loss, scores, labels) = self.forward_batch(model, batch);
            let loss_value: f64 = loss.into_scalar().elem::<f64>();

            let (labels, scores) = final_column(scores, labels)?;
            acc.record_batch(loss_value, &labels, &scores);
            observer.on_batch(PassMode::Eval, i, loss_value);
        }

        let stats = acc.finish()?;
        observer.on_pass_end(PassMode::Eval, &stats);
        Ok(stats)
    }

    /// Forward + gather + loss for one batch: (loss, scores, labels).
    fn forward_batch<B, M>(
        &self,
        model: &M,
        batch: KtBatch<B>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>, Tensor<B, 2, Int>)
    where
        B: Backend,
        M: KnowledgeTracingModel<B>,
    {
        let raw = model.forward_scores(batch.inputs, batch.targets.clone());
        let scores = match self.gather {
            Gather::TargetIndex => raw.gather(1, batch.targets),
            Gather::PerStep     => raw,
        };

        let loss = BinaryCrossEntropyLossConfig::new()
            .with_logits(self.score_kind == ScoreKind::Logits)
            .init(&scores.device())
            .forward(scores.clone(), batch.labels.clone());

        (loss, scores, batch.labels)
    }
}

/// Copy the last column of scores and labels to the host.
fn final_column<B: Backend>(
    scores: Tensor<B, 2>,
    labels: Tensor<B, 2, Int>,
) -> Result<(Vec<u8>, Vec<f32>)> {
    let [batch, width] = scores.dims();

    let scores: Vec<f32> = scores
        .slice([0..batch, width - 1..width])
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow!("cannot read scores back from device: {e:?}"))?;

    let labels: Vec<i64> = labels
        .slice([0..batch, width - 1..width])
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|e| anyhow!("cannot read labels back from device: {e:?}"))?;

    let labels = labels.into_iter().map(|l| u8::from(l == 1)).collect();
    Ok((labels, scores))
}

// ─── TracingObserver ──────────────────────────────────────────────────────────
/// Reports progress through `tracing`: per-batch loss at debug,
/// pass summaries at info.
#[derive(Debug, Default)]
pub struct TracingObserver {
    pub every_n_batches: usize,
}

impl TracingObserver {
    pub fn new(every_n_batches: usize) -> Self {
        Self { every_n_batches: every_n_batches.max(1) }
    }
}

impl PassObserver for TracingObserver {
    fn on_batch(&mut self, mode: PassMode, batch_index: usize, loss: f64) {
        if batch_index % self.every_n_batches.max(1) == 0 {
            tracing::debug!("[{}] batch {:>5} loss - {:.4}", mode.label(), batch_index, loss);
        }
    }

    fn on_pass_end(&mut self, mode: PassMode, stats: &PassStats) {
        tracing::info!(
            "[{}] {} examples | loss={:.4} acc={:.4} auc={:.4}",
            mode.label(),
            stats.examples,
            stats.mean_loss,
            stats.accuracy,
            stats.auc
        );
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::batcher::Batcher,
        optim::AdamConfig,
    };

    use crate::data::batcher::KtBatcher;
    use crate::data::encoder::{EncodedSample, EncoderVariant, SequenceEncoder};
    use crate::domain::error::KtError;
    use crate::domain::interaction::LearnerHistory;
    use crate::domain::traits::SilentObserver;
    use crate::ml::dkt::{DktConfig, DktModel};
    use crate::ml::sakt::{SaktConfig, SaktModel};

    type TrainBackend = Autodiff<NdArray>;

    fn samples(variant: EncoderVariant) -> Vec<EncodedSample> {
        let enc = SequenceEncoder::new(6, 5, variant).unwrap();
        (0..8i64)
            .map(|i| {
                let skills: Vec<i64> = (0..5).map(|k| (i + k) % 6).collect();
                let correct: Vec<u8> = (0..5).map(|k| ((i + k) % 2) as u8).collect();
                enc.encode(&LearnerHistory::new(i, skills, correct).unwrap()).unwrap()
            })
            .collect()
    }

    fn batches<B: Backend>(items: Vec<EncodedSample>, size: usize) -> Vec<KtBatch<B>> {
        let batcher = KtBatcher::<B>::new(Default::default());
        items.chunks(size).map(|c| batcher.batch(c.to_vec())).collect()
    }

    #[test]
    fn test_dkt_train_then_eval_pass() {
        let device = Default::default();
        let model: DktModel<TrainBackend> = DktConfig::new(6)
            .with_embed_dim(8)
            .with_hidden_dim(8)
            .init(&device);
        let mut optim = AdamConfig::new().init::<TrainBackend, DktModel<TrainBackend>>();
        let looper    = EvaluationLoop::for_model(ModelKind::Dkt);

        let data = samples(EncoderVariant::NextStep);
        let (model, stats) = looper
            .train_pass(model, &mut optim, 1e-3, batches::<TrainBackend>(data.clone(), 3), &mut SilentObserver)
            .unwrap();

        assert_eq!(stats.examples, 8);
        assert!(stats.mean_loss.is_finite());
        assert!((0.0..=1.0).contains(&stats.accuracy));
        assert!((0.0..=1.0).contains(&stats.auc));

        let valid = model.valid();
        let stats = looper
            .eval_pass(&valid, batches::<NdArray>(data, 4), &mut SilentObserver)
            .unwrap();
        assert_eq!(stats.examples, 8);
    }

    #[test]
    fn test_sakt_scores_last_step_only() {
        let device = Default::default();
        let model: SaktModel<NdArray> = SaktConfig::new(6, 4)
            .with_embed_dim(8)
            .with_num_heads(2)
            .init(&device);
        let looper = EvaluationLoop::for_model(ModelKind::Sakt);

        let stats = looper
            .eval_pass(&model, batches::<NdArray>(samples(EncoderVariant::Shifted), 3), &mut SilentObserver)
            .unwrap();

        // One (label, score) pair per learner, not per position
        assert_eq!(stats.examples, 8);
    }

    #[test]
    fn test_single_class_pass_is_degenerate() {
        let device = Default::default();
        let model: DktModel<NdArray> = DktConfig::new(6)
            .with_embed_dim(4)
            .with_hidden_dim(4)
            .init(&device);
        let looper = EvaluationLoop::for_model(ModelKind::Dkt);

        let mut data = samples(EncoderVariant::NextStep);
        for s in &mut data {
            s.labels = vec![1];
        }

        let err = looper
            .eval_pass(&model, batches::<NdArray>(data, 4), &mut SilentObserver)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KtError>(),
            Some(KtError::DegenerateLabelSet { negatives: 0, .. })
        ));
    }

    #[test]
    fn test_observer_sees_every_batch() {
        #[derive(Default)]
        struct Counting {
            batches: usize,
            ends:    usize,
        }
        impl PassObserver for Counting {
            fn on_batch(&mut self, _: PassMode, _: usize, _: f64) {
                self.batches += 1;
            }
            fn on_pass_end(&mut self, _: PassMode, _: &PassStats) {
                self.ends += 1;
            }
        }

        let device = Default::default();
        let model: DktModel<NdArray> = DktConfig::new(6)
            .with_embed_dim(4)
            .with_hidden_dim(4)
            .init(&device);
        let mut observer = Counting::default();

        EvaluationLoop::for_model(ModelKind::Dkt)
            .eval_pass(&model, batches::<NdArray>(samples(EncoderVariant::NextStep), 3), &mut observer)
            .unwrap();

        assert_eq!(observer.batches, 3);
        assert_eq!(observer.ends,    1);
    }
}
