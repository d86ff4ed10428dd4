// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of knowledge tracing.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, traits and pure functions
//
// Everything here is unit-testable without a tensor backend.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Interaction records and per-learner histories
pub mod interaction;

// The error taxonomy shared by every layer below the CLI
pub mod error;

// ROC-AUC and per-pass metric accumulation
pub mod scoring;

// Core abstractions (traits) that other layers implement
pub mod traits;
