// ============================================================
// Layer 4 — Schema Reader
// ============================================================
// Loads a metadata document and exposes its record sets as
// lazy, replayable record streams (the RecordSource trait).
//
// How iteration works:
//   - Inline record sets iterate over the rows embedded in
//     the metadata document itself.
//   - File-backed record sets open their JSONL file fresh on
//     every records() call and parse one line per pull.
//
// Either way, records() hands back a brand new iterator each
// time — that restartability is what lets the training loop
// replay the same record set once per epoch.
//
// Only declared fields make it into a Record. Extra keys in a
// row are ignored; a missing declared field is an error.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::error::DataError;
use crate::domain::record::{FieldValue, Record};
use crate::domain::traits::{RecordSource, RecordStream};
use crate::schema::metadata::{DataType, DatasetMetadata, FieldDef, RecordSetDef};

/// Reads record sets described by a dataset metadata document.
pub struct SchemaReader {
    metadata: DatasetMetadata,
    /// Directory the metadata file lives in — JSONL source
    /// paths are resolved relative to it
    base_dir: PathBuf,
}

impl SchemaReader {
    /// Parse a metadata document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read metadata file '{}'", path.display()))?;

        let metadata: DatasetMetadata = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse metadata file '{}'", path.display()))?;

        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        tracing::info!(
            "Loaded metadata for dataset '{}' ({} record sets)",
            metadata.name,
            metadata.record_sets.len()
        );

        Ok(Self { metadata, base_dir })
    }

    /// Build a reader from an already parsed document.
    /// Mostly useful in tests and demos with inline data.
    pub fn from_metadata(metadata: DatasetMetadata, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata,
            base_dir: base_dir.into(),
        }
    }

    /// The parsed metadata document.
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Find a record set or fail with the typed NotFound error.
    fn set(&self, name: &str) -> Result<&RecordSetDef, DataError> {
        self.metadata
            .record_set(name)
            .ok_or_else(|| DataError::NotFound(name.to_string()))
    }
}

impl RecordSource for SchemaReader {
    fn field_names(&self, record_set: &str) -> Result<Vec<String>, DataError> {
        let set = self.set(record_set)?;
        Ok(set.fields.iter().map(|f| f.name.clone()).collect())
    }

    fn record_count(&self, record_set: &str) -> Result<usize, DataError> {
        let set = self.set(record_set)?;

        // Prefer the declared count; fall back to counting a
        // full pass when the metadata doesn't state one.
        if let Some(n) = set.record_count {
            return Ok(n);
        }
        let mut n = 0usize;
        for record in self.records(record_set)? {
            record?;
            n += 1;
        }
        Ok(n)
    }

    fn records(&self, record_set: &str) -> Result<RecordStream<'_>, DataError> {
        let set = self.set(record_set)?;

        // Inline rows — iterate the metadata document itself
        if let Some(rows) = &set.data {
            let iter = rows.iter().map(move |row| convert_row(set, row));
            return Ok(Box::new(iter));
        }

        // File-backed rows — open the JSONL file fresh so the
        // stream restarts from the first line
        if let Some(source) = &set.source {
            let path = self.base_dir.join(&source.path);
            let file = File::open(&path).map_err(|e| DataError::Io {
                path:   path.display().to_string(),
                source: e,
            })?;
            let display = path.display().to_string();

            let iter = BufReader::new(file).lines().map(move |line| {
                let line = line.map_err(|e| DataError::Io {
                    path:   display.clone(),
                    source: e,
                })?;
                let row: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(&line)
                        .map_err(|e| DataError::Malformed(format!("bad JSONL line: {e}")))?;
                convert_row(set, &row)
            });
            return Ok(Box::new(iter));
        }

        Err(DataError::Malformed(format!(
            "record set '{}' has neither inline data nor a source file",
            set.name
        )))
    }
}

/// Match one raw JSON row against the record set's declared
/// fields, producing a typed Record.
fn convert_row(
    set: &RecordSetDef,
    row: &serde_json::Map<String, serde_json::Value>,
) -> Result<Record, DataError> {
    let mut record = Record::new();
    for field in &set.fields {
        let value = row.get(&field.name).ok_or_else(|| {
            DataError::Malformed(format!(
                "record set '{}': row is missing field '{}'",
                set.name, field.name
            ))
        })?;
        record.insert(&field.name, convert_value(field, value)?);
    }
    Ok(record)
}

/// Convert one raw JSON value to the field's declared type.
fn convert_value(field: &FieldDef, value: &serde_json::Value) -> Result<FieldValue, DataError> {
    match field.data_type {
        DataType::String => value
            .as_str()
            .map(|s| FieldValue::Text(s.to_string()))
            .ok_or_else(|| type_mismatch(field, "string", value)),

        // Bytes travel as the UTF-8 bytes of a JSON string;
        // they stay raw here and only become text again if the
        // adapter is asked to decode them
        DataType::Bytes => value
            .as_str()
            .map(|s| FieldValue::Bytes(s.as_bytes().to_vec()))
            .ok_or_else(|| type_mismatch(field, "bytes", value)),

        DataType::Integer => value
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| type_mismatch(field, "integer", value)),

        DataType::Float => value
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| type_mismatch(field, "float", value)),
    }
}

fn type_mismatch(field: &FieldDef, expected: &str, value: &serde_json::Value) -> DataError {
    DataError::Malformed(format!(
        "field '{}' declares {} but the row holds {}",
        field.name, expected, value
    ))
}
