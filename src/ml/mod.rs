// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Burn-specific code lives here; the data layer only touches
// burn for its Dataset and Batcher impls.
//
//   model.rs       — KnowledgeTracingModel trait + ModelKind
//   dkt.rs         — recurrent model (embedding → LSTM → linear)
//   sakt.rs        — self-attentive model with a causal mask
//   evaluation.rs  — one train / eval pass: loss, accuracy, AUC
//   trainer.rs     — backend selection, epoch loop, checkpoints
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Piech et al. (2015) Deep Knowledge Tracing
//            Pandey & Karypis (2019) SAKT

pub mod model;

pub mod dkt;

pub mod sakt;

/// Shared train / validation pass
pub mod evaluation;

/// Full training loop with validation and checkpointing
pub mod trainer;
