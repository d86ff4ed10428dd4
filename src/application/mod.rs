// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one command (prepare, train or evaluate).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination and the serialisable configs

/// Raw log → skills.csv, users.csv, train.csv, val.csv
pub mod prepare_use_case;

/// Record files → trained checkpoints
pub mod train_use_case;

/// Checkpoint + record file → (loss, acc, auc)
pub mod evaluate_use_case;
