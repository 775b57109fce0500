// ============================================================
// Layer 4 — Dataset Metadata Schema
// ============================================================
// serde structs for the metadata document that describes a
// dataset: which record sets it contains, which fields each
// record set has, and where the records live.
//
// The document is a small Croissant-flavoured JSON file:
//
//   {
//     "name": "flores200-langid",
//     "recordSets": [
//       {
//         "name": "train",
//         "recordCount": 3,
//         "fields": [
//           {"name": "sentence", "dataType": "bytes"},
//           {"name": "language", "dataType": "string"}
//         ],
//         "data": [ {"sentence": "...", "language": "eng"} ]
//       }
//     ]
//   }
//
// A record set holds its rows either inline ("data") or in a
// JSONL file next to the metadata ("source": {"path": ...}).
// A field declared as "bytes" stores its value as a JSON
// string whose UTF-8 bytes are the payload — decoding those
// bytes back to text is the adapter's job, not the schema's.
//
// Reference: Rust Book §10 (Derive Macros)
//            serde documentation (rename_all, default)

use serde::{Deserialize, Serialize};

/// The on-disk data type a field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// UTF-8 text stored directly as a JSON string
    String,
    /// Raw bytes, stored as the UTF-8 bytes of a JSON string
    Bytes,
    /// Signed integer scalar
    Integer,
    /// Floating point scalar
    Float,
}

/// One field declaration inside a record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name, unique within the record set
    pub name: String,

    /// Declared on-disk type of the field's values
    pub data_type: DataType,
}

/// Where a record set's rows live when they are not inline:
/// a JSONL file (one JSON object per line), with a path
/// resolved relative to the metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDef {
    pub path: String,
}

/// One named record set: a finite, replayable sequence of
/// records sharing the same fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSetDef {
    /// Record set name, unique within the dataset
    pub name: String,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Declared number of records — used for step planning
    #[serde(default)]
    pub record_count: Option<usize>,

    /// Field declarations, in schema order
    pub fields: Vec<FieldDef>,

    /// Inline rows (small record sets, tests, demos)
    #[serde(default)]
    pub data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,

    /// External JSONL source (large record sets)
    #[serde(default)]
    pub source: Option<SourceDef>,
}

impl RecordSetDef {
    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The whole metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    /// Dataset name
    pub name: String,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// All record sets the dataset exposes
    pub record_sets: Vec<RecordSetDef>,
}

impl DatasetMetadata {
    /// Look up a record set by name.
    pub fn record_set(&self, name: &str) -> Option<&RecordSetDef> {
        self.record_sets.iter().find(|rs| rs.name == name)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "name": "mini",
            "recordSets": [
                {
                    "name": "train",
                    "recordCount": 2,
                    "fields": [
                        {"name": "sentence", "dataType": "bytes"},
                        {"name": "language", "dataType": "string"}
                    ],
                    "data": [
                        {"sentence": "Bonjour", "language": "fra"},
                        {"sentence": "Hello",   "language": "eng"}
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_parses_metadata_document() {
        let md: DatasetMetadata = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(md.name, "mini");
        assert_eq!(md.record_sets.len(), 1);

        let train = md.record_set("train").unwrap();
        assert_eq!(train.record_count, Some(2));
        assert_eq!(train.fields.len(), 2);
        assert_eq!(train.field("sentence").unwrap().data_type, DataType::Bytes);
        assert_eq!(train.field("language").unwrap().data_type, DataType::String);
        assert_eq!(train.data.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_record_set_is_none() {
        let md: DatasetMetadata = serde_json::from_str(sample_json()).unwrap();
        assert!(md.record_set("validation").is_none());
    }
}
