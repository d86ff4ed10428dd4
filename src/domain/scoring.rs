// ============================================================
// Layer 3 — Scoring
// ============================================================
// Pure metric code for one pass over a dataset:
//
//   mean loss  = average of the per-batch losses
//   accuracy   = correct binarised predictions / examples seen
//   auc        = area under the ROC curve over EVERY
//                (label, score) pair collected in the pass
//
// The AUC is exact, not a running estimate, so the accumulator
// buffers every label and score until the pass ends. That is
// fine while one epoch of scalars fits in memory; it is the
// scaling limit of this design.
//
// Reference: Fawcett (2006) An introduction to ROC analysis

use serde::{Deserialize, Serialize};

use crate::domain::error::KtError;

/// What kind of number the model hands back per prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreKind {
    /// Unbounded scores; a sigmoid maps them to probabilities
    Logits,
    /// Already in [0, 1]
    Probabilities,
}

impl ScoreKind {
    pub fn probability(self, score: f32) -> f32 {
        match self {
            ScoreKind::Logits        => 1.0 / (1.0 + (-score).exp()),
            ScoreKind::Probabilities => score,
        }
    }
}

/// Area under the ROC curve for binary `labels` (0/1) and real `scores`.
///
/// Scores are ranked descending; tied scores move the curve
/// diagonally, which gives the same value as the trapezoidal rule
/// used by scikit-learn's `roc_auc_score`.
///
/// # Errors
/// `KtError::DegenerateLabelSet` if the labels hold only one class
/// (this includes the empty input), `KtError::NonFiniteScore` if any
/// score is NaN or infinite.
pub fn roc_auc(labels: &[u8], scores: &[f32]) -> Result<f64, KtError> {
    debug_assert_eq!(labels.len(), scores.len());

    if let Some((index, &value)) = scores.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(KtError::NonFiniteScore { index, value });
    }

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(KtError::DegenerateLabelSet { positives, negatives });
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut area = 0.0f64;
    let mut tp   = 0usize;
    let mut fp   = 0usize;
    let mut i    = 0usize;

    while i < order.len() {
        // Consume one group of equal scores
        let score      = scores[order[i]];
        let (tp0, fp0) = (tp, fp);
        while i < order.len() && scores[order[i]].total_cmp(&score).is_eq() {
            if labels[order[i]] == 1 { tp += 1 } else { fp += 1 }
            i += 1;
        }
        area += (fp - fp0) as f64 * (tp + tp0) as f64 / 2.0;
    }

    Ok(area / (positives as f64 * negatives as f64))
}

/// Aggregate statistics for one pass (epoch) over a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassStats {
    pub mean_loss: f64,
    pub accuracy:  f64,
    pub auc:       f64,
    /// Number of (label, score) pairs the metrics were computed from
    pub examples:  usize,
}

/// Collects per-batch results during a pass and reduces them at the end.
#[derive(Debug, Clone)]
pub struct PassAccumulator {
    score_kind:  ScoreKind,
    losses:      Vec<f64>,
    num_correct: usize,
    labels:      Vec<u8>,
    scores:      Vec<f32>,
}

impl PassAccumulator {
    pub fn new(score_kind: ScoreKind) -> Self {
        Self {
            score_kind,
            losses:      Vec::new(),
            num_correct: 0,
            labels:      Vec::new(),
            scores:      Vec::new(),
        }
    }

    /// Record one batch: its loss and the aligned labels / raw scores.
    ///
    /// A prediction counts as positive when its probability is >= 0.5.
    pub fn record_batch(&mut self, loss: f64, labels: &[u8], scores: &[f32]) {
        debug_assert_eq!(labels.len(), scores.len());

        let kind = self.score_kind;
        let correct = labels
            .iter()
            .zip(scores)
            .filter(|&(&l, &s)| u8::from(kind.probability(s) >= 0.5) == l)
            .count();

        self.losses.push(loss);
        self.num_correct += correct;
        self.labels.extend_from_slice(labels);
        self.scores.extend_from_slice(scores);
    }

    /// Reduce everything seen so far into `(mean_loss, accuracy, auc)`.
    pub fn finish(&self) -> Result<PassStats, KtError> {
        let auc = roc_auc(&self.labels, &self.scores)?;

        let total     = self.labels.len();
        let mean_loss = self.losses.iter().sum::<f64>() / self.losses.len() as f64;
        let accuracy  = self.num_correct as f64 / total as f64;

        Ok(PassStats { mean_loss, accuracy, auc, examples: total })
    }
}
