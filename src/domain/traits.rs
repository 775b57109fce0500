// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Traits are Rust's way of defining shared behaviour —
// similar to interfaces in Java or abstract classes in Python.
//
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - SchemaReader implements RecordSource
//   - A future ParquetSource could also implement RecordSource
//   - The adapter and the application layer only see
//     RecordSource and work with both without any changes
//
// This is the Dependency Inversion Principle from SOLID,
// applied using Rust's trait system.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use crate::domain::error::DataError;
use crate::domain::record::Record;

/// A boxed, lazily evaluated stream of records. Each pull can
/// fail on its own (I/O, malformed row), so items are Results.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<Record, DataError>> + 'a>;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component exposing named, finite, replayable record sets.
///
/// Implementations:
///   - SchemaReader → reads a Croissant-style metadata document
///   - (future) ParquetSource → reads columnar files directly
pub trait RecordSource {
    /// The field names a record set declares, in schema order.
    /// Fails with NotFound for an unknown record set name.
    fn field_names(&self, record_set: &str) -> Result<Vec<String>, DataError>;

    /// The number of records the record set declares.
    /// Used for step planning, never to truncate iteration.
    fn record_count(&self, record_set: &str) -> Result<usize, DataError>;

    /// A fresh, lazy iterator over the record set. Calling this
    /// again restarts iteration from the beginning — this is
    /// what makes an epoch replayable.
    fn records(&self, record_set: &str) -> Result<RecordStream<'_>, DataError>;
}

// ─── LanguageIdentifier ───────────────────────────────────────────────────────
/// Any component that can name the language of a piece of text.
///
/// Implementations:
///   - PredictUseCase → uses the fine-tuned transformer
///   - (future) HeuristicIdentifier → uses character n-grams
pub trait LanguageIdentifier {
    /// Return the predicted label string for `text` together
    /// with the model's confidence in [0, 1].
    fn identify(&self, text: &str) -> anyhow::Result<(String, f32)>;
}
