// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//   - RecordFile implements HistorySource, and KtDataset::load
//     takes any HistorySource, so training and evaluation do not
//     depend on how histories are stored
//   - The evaluation loop reports progress through PassObserver
//     instead of printing, so callers decide where it goes
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::interaction::LearnerHistory;
use crate::domain::scoring::PassStats;

// ─── HistorySource ────────────────────────────────────────────────────────────
/// Anything that can produce chronologically ordered learner histories.
pub trait HistorySource {
    fn load_histories(&self) -> Result<Vec<LearnerHistory>>;
}

// ─── PassMode ─────────────────────────────────────────────────────────────────
/// Whether a pass updates model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Train,
    Eval,
}

impl PassMode {
    pub fn label(self) -> &'static str {
        match self {
            PassMode::Train => "train",
            PassMode::Eval  => "val",
        }
    }
}

// ─── PassObserver ─────────────────────────────────────────────────────────────
/// Receives progress events from the evaluation loop.
///
/// Both methods default to no-ops so an observer only overrides
/// the events it cares about.
pub trait PassObserver {
    /// Called after every batch with the batch's scalar loss.
    fn on_batch(&mut self, _mode: PassMode, _batch_index: usize, _loss: f64) {}

    /// Called once the pass is complete and its metrics are known.
    fn on_pass_end(&mut self, _mode: PassMode, _stats: &PassStats) {}
}

/// Observer that ignores every event.
pub struct SilentObserver;

impl PassObserver for SilentObserver {}
