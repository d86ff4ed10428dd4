// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure here is a deterministic data-validity problem,
// never a transient one, so nothing is retried. The use cases
// wrap these in anyhow with file context and abort the run.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KtError {
    /// Skill and correctness sequences disagree in length, are empty,
    /// or contain values that cannot be parsed.
    #[error("invalid learner history: {0}")]
    InvalidHistory(String),

    /// ROC-AUC is undefined when every collected label is the same class.
    #[error(
        "cannot compute AUC over a single-class label set \
         ({positives} positive, {negatives} negative)"
    )]
    DegenerateLabelSet { positives: usize, negatives: usize },

    /// A model emitted NaN or an infinity, so scores cannot be ranked.
    #[error("score {value} at position {index} is not a finite number")]
    NonFiniteScore { index: usize, value: f32 },

    /// The dataset identifier is not one the preprocessor or trainer knows.
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
