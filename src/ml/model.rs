use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::data::encoder::EncoderVariant;
use crate::domain::error::KtError;
use crate::domain::scoring::ScoreKind;
use crate::ml::evaluation::Gather;

/// A sequence model that scores how likely a learner is to answer correctly.
///
/// `inputs` are fused skill/correctness tokens `[batch, input_len]`,
/// `targets` the skill ids being asked about `[batch, target_len]`.
/// The returned score tensor is `[batch, n_skill]` for models that
/// predict over every skill, or `[batch, target_len]` for models that
/// score each target directly.
pub trait KnowledgeTracingModel<B: Backend> {
    fn forward_scores(&self, inputs: Tensor<B, 2, Int>, targets: Tensor<B, 2, Int>) -> Tensor<B, 2>;
}

/// The two model families the trainer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Deep Knowledge Tracing: LSTM over fused tokens, one prediction per learner
    Dkt,
    /// Self-Attentive Knowledge Tracing: causal attention, one prediction per step
    Sakt,
}

impl ModelKind {
    pub fn encoder_variant(self) -> EncoderVariant {
        match self {
            ModelKind::Dkt  => EncoderVariant::NextStep,
            ModelKind::Sakt => EncoderVariant::Shifted,
        }
    }

    pub fn gather(self) -> Gather {
        match self {
            ModelKind::Dkt  => Gather::TargetIndex,
            ModelKind::Sakt => Gather::PerStep,
        }
    }

    pub fn score_kind(self) -> ScoreKind {
        match self {
            ModelKind::Dkt  => ScoreKind::Logits,
            ModelKind::Sakt => ScoreKind::Probabilities,
        }
    }

    /// Smallest window that still leaves the model at least one input step.
    pub fn min_max_seq(self) -> usize {
        match self {
            ModelKind::Dkt  => 3,
            ModelKind::Sakt => 2,
        }
    }
}

impl FromStr for ModelKind {
    type Err = KtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dkt"  => Ok(ModelKind::Dkt),
            "sakt" => Ok(ModelKind::Sakt),
            other  => Err(KtError::InvalidConfig(format!(
                "unknown model '{other}', expected 'dkt' or 'sakt'"
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Dkt  => f.write_str("dkt"),
            ModelKind::Sakt => f.write_str("sakt"),
        }
    }
}
