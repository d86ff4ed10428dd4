// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw interaction logs to tensor batches.
//
//   raw CSV log
//       │
//       ▼
//   RawLogLoader      → parses rows by header name
//       │
//       ▼
//   Preprocessor      → drops bad rows, groups per learner
//       │
//       ▼
//   split_train_val   → learner-wise random split
//       │
//       ▼
//   RecordFile        → persisted 3-line-per-learner format
//       │
//       ▼
//   SequenceEncoder   → fixed-length window + fused tokens
//       │
//       ▼
//   KtDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   KtBatcher         → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses raw interaction logs per dataset layout
pub mod loader;

/// Cleans rows and groups them into learner histories
pub mod preprocessor;

/// Shuffles and splits learners into train/validation sets
pub mod splitter;

/// Reads and writes the three-line learner record format
pub mod record_file;

/// Windows a learner history into a fixed-length sample
pub mod encoder;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
