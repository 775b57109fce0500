// ============================================================
// Layer 3 — Record Domain Type
// ============================================================
// Represents one record pulled out of a record set: a mapping
// from field name to a typed value.
//
// A Record is a plain data struct with no behaviour beyond
// field access. By the time a Record exists, the schema reader
// has already matched each raw JSON value against the field's
// declared data type, so a FieldValue is always well-typed.
//
// BTreeMap (not HashMap) keeps field iteration order
// deterministic, which matters for reproducible test output.
//
// Reference: Rust Book §5 (Structs and Methods)
//            Rust Book §8 (Collections)

use std::collections::BTreeMap;

/// A single typed field value inside a record.
///
/// The variants mirror the data types a metadata document can
/// declare for a field: text, raw bytes, and the two scalar
/// kinds. Decoding bytes → text is the adapter's job, not the
/// record's.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// UTF-8 text, either declared as string or already decoded
    Text(String),

    /// Raw bytes exactly as stored — the on-disk encoding
    /// of fields declared with dataType "bytes"
    Bytes(Vec<u8>),

    /// Signed integer scalar
    Integer(i64),

    /// Floating point scalar
    Float(f64),
}

impl FieldValue {
    /// Borrow the value as text if it is the Text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as raw bytes if it is the Bytes variant.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// One record of a record set: field name → typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record. Fields are added with insert().
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Remove a field and take ownership of its value.
    /// Used by the adapter when decoding a field in place.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Number of fields present in this record.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterate fields in deterministic (sorted) name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut r = Record::new();
        r.insert("language", FieldValue::Text("eng".into()));
        assert_eq!(r.get("language").and_then(|v| v.as_text()), Some("eng"));
        assert!(r.get("missing").is_none());
    }

    #[test]
    fn test_take_removes_field() {
        let mut r = Record::new();
        r.insert("sentence", FieldValue::Bytes(b"bonjour".to_vec()));
        let v = r.take("sentence");
        assert_eq!(v, Some(FieldValue::Bytes(b"bonjour".to_vec())));
        assert!(r.get("sentence").is_none());
    }

    #[test]
    fn test_iteration_order_is_sorted() {
        let mut r = Record::new();
        r.insert("z", FieldValue::Integer(1));
        r.insert("a", FieldValue::Integer(2));
        let names: Vec<&str> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "z"]);
    }
}
