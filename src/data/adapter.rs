// ============================================================
// Layer 4 — Record Set Adapter
// ============================================================
// A thin pass-through wrapper that connects a RecordSource to
// the pipeline stages. The adapter does exactly two things:
//
//   1. Validates up front — before any record is pulled —
//      that the record set exists (NotFound otherwise) and
//      that every field named in the caller's FieldRead
//      specification is declared by the record set's schema
//      (InvalidArgument otherwise).
//
//   2. Decodes declared fields from their on-disk encoding to
//      the type the caller expects. Today that means one
//      thing: raw bytes → UTF-8 text. Fields not named in the
//      specification pass through untouched.
//
// Iteration stays lazy, restartable (a fresh stream per
// records() call) and order-preserving relative to the
// underlying source. A decode failure aborts the current
// pull — there is no skip-and-continue.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Rust Book §9 (Error Handling)

use crate::domain::error::DataError;
use crate::domain::record::{FieldValue, Record};
use crate::domain::traits::{RecordSource, RecordStream};

/// How the caller wants one field delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRead {
    /// Hand the field over exactly as the source stored it
    AsIs,

    /// Decode the field's raw bytes to a UTF-8 String.
    /// A field that is already text passes through unchanged;
    /// anything else fails with a Decode error.
    Utf8Text,
}

/// Adapts one record set of a RecordSource into a decoded,
/// pipeline-ready record stream.
pub struct RecordSetAdapter<'a, S: RecordSource> {
    source:      &'a S,
    record_set:  String,
    field_reads: Vec<(String, FieldRead)>,
}

impl<'a, S: RecordSource> RecordSetAdapter<'a, S> {
    /// Create an adapter and validate the caller's field
    /// specification against the record set's schema.
    ///
    /// Fails fast, before iteration begins:
    ///   - NotFound        → unknown record set name
    ///   - InvalidArgument → specification names an undeclared field
    pub fn new(
        source: &'a S,
        record_set: impl Into<String>,
        field_reads: Vec<(String, FieldRead)>,
    ) -> Result<Self, DataError> {
        let record_set = record_set.into();

        // field_names() already fails with NotFound for an
        // unknown record set, covering the first contract
        let declared = source.field_names(&record_set)?;

        for (name, _) in &field_reads {
            if !declared.iter().any(|f| f == name) {
                return Err(DataError::InvalidArgument(format!(
                    "field '{}' is not declared by record set '{}' (declared: {})",
                    name,
                    record_set,
                    declared.join(", ")
                )));
            }
        }

        Ok(Self {
            source,
            record_set,
            field_reads,
        })
    }

    /// The name of the record set this adapter serves.
    pub fn record_set(&self) -> &str {
        &self.record_set
    }

    /// The declared record count, for step planning.
    pub fn record_count(&self) -> Result<usize, DataError> {
        self.source.record_count(&self.record_set)
    }

    /// A fresh lazy stream of decoded records. Calling this
    /// again restarts the pass — one call per epoch.
    pub fn records(&self) -> Result<RecordStream<'_>, DataError> {
        let stream = self.source.records(&self.record_set)?;
        let reads  = self.field_reads.clone();

        let iter = stream.map(move |record| {
            let mut record = record?;
            for (name, read) in &reads {
                decode_field(&mut record, name, *read)?;
            }
            Ok(record)
        });
        Ok(Box::new(iter))
    }
}

/// Apply one FieldRead to one field of a record, in place.
fn decode_field(record: &mut Record, name: &str, read: FieldRead) -> Result<(), DataError> {
    if read == FieldRead::AsIs {
        return Ok(());
    }

    // Validation guaranteed the field is declared, but a
    // malformed row may still lack it at pull time
    let value = record
        .take(name)
        .ok_or_else(|| DataError::Malformed(format!("record has no field '{name}'")))?;

    let decoded = match value {
        FieldValue::Bytes(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| DataError::decode(name, format!("invalid UTF-8: {e}")))?;
            FieldValue::Text(text)
        }
        FieldValue::Text(text) => FieldValue::Text(text),
        other => {
            return Err(DataError::decode(
                name,
                format!("expected bytes or text, found {other:?}"),
            ))
        }
    };

    record.insert(name, decoded);
    Ok(())
}
