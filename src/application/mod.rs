// ============================================================
// Layer 2 — Application Layer (Use Cases)
// ============================================================
// Each use case is one complete user-facing workflow,
// orchestrating the lower layers from start to finish:
//
//   train_use_case.rs   — "Train a language identifier"
//                         metadata → labels → tokenizer →
//                         training loop → checkpoints
//
//   predict_use_case.rs — "Which language is this sentence?"
//                         checkpoint → tokenizer → model →
//                         label + confidence
//
// Use cases own configuration and sequencing; the layers below
// them own the mechanics. The CLI above them owns only argument
// parsing and printing.
//
// Reference: Rust Book §7 (Managing Growing Projects)

/// Training workflow and its configuration
pub mod train_use_case;

/// Inference workflow over a saved checkpoint
pub mod predict_use_case;
