// ============================================================
// Layer 4 — Schema Layer
// ============================================================
// Everything about *describing* a dataset, as opposed to
// consuming one (that's the data layer):
//
//   metadata.rs — serde structs for the metadata document
//                 (record sets, fields, data types, sources)
//
//   reader.rs   — SchemaReader, which turns those definitions
//                 into lazy record streams and implements the
//                 RecordSource trait from Layer 3
//
// The split keeps the document format independent from the
// iteration machinery — a different reader could serve the
// same metadata structs from a database or an object store.
//
// Reference: Rust Book §7 (Modules)

/// serde structs for the dataset metadata document
pub mod metadata;

/// SchemaReader — record sets as lazy, replayable streams
pub mod reader;
