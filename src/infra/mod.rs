// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the training and
// evaluation use cases:
//
//   checkpoint.rs — model weights via Burn's CompactRecorder,
//                   plus TrainConfig as JSON so evaluation can
//                   rebuild the exact model
//
//   metrics.rs    — one CSV row per epoch (loss, accuracy, AUC
//                   for both passes)
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
