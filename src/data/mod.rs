// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a described record set
// all the way to device-ready tensor batches.
//
// The pipeline flows in this order:
//
//   metadata document
//       │
//       ▼
//   SchemaReader      → record sets as lazy record streams
//       │
//       ▼
//   RecordSetAdapter  → validates the field spec, decodes
//       │               bytes → text per the caller's request
//       ▼
//   ShuffleBuffer     → bounded-window randomisation (train only)
//       │
//       ▼
//   ShardFilter       → deterministic worker partition
//       │
//       ▼
//   encode_record     → tokenise, pad, map label → class index
//       │
//       ▼
//   Batched           → fixed-size Vec groups
//       │
//       ▼
//   LangIdBatcher     → stacks samples into tensor batches
//
// Each module is responsible for exactly one step. This makes
// each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Validates field specs and decodes record fields
pub mod adapter;

/// Shuffle, shard-filter and batching iterator stages
pub mod pipeline;

/// The frozen label ↔ class-index bijection
pub mod labels;

/// Tokenise records into padded samples
pub mod sample;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
