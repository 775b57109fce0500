// ============================================================
// Layer 3 — Data Errors
// ============================================================
// Typed failure contract for the schema reader, the dataset
// adapter, and the pipeline stages.
//
// Why a typed enum instead of anyhow everywhere?
//   The adapter promises to fail fast with a *specific* kind
//   of error before iteration even starts:
//     - NotFound        → the record set name is unknown
//     - InvalidArgument → a declared field doesn't exist
//   Callers (and tests) match on these variants, which is
//   impossible with an opaque anyhow::Error. At the
//   application boundary the enum converts into anyhow
//   automatically via the std::error::Error impl that
//   thiserror derives for us.
//
// Reference: Rust Book §9 (Error Handling)
//            thiserror crate documentation

use thiserror::Error;

/// Every way the data layers can fail.
/// All failures are fatal to the current run — there is no
/// retry or skip-and-continue policy anywhere in the pipeline.
#[derive(Debug, Error)]
pub enum DataError {
    /// The requested record set does not exist in the metadata.
    /// Raised before iteration begins.
    #[error("record set '{0}' not found in the dataset metadata")]
    NotFound(String),

    /// The caller's field specification names a field the
    /// record set's schema doesn't declare, or a config value
    /// is out of its valid range. Raised before iteration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A field value could not be decoded to the type the
    /// caller declared (e.g. raw bytes that are not UTF-8).
    /// Aborts the current pipeline pull.
    #[error("cannot decode field '{field}': {reason}")]
    Decode { field: String, reason: String },

    /// A record is structurally broken — a field is missing
    /// or its JSON value doesn't match the declared data type.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Underlying file I/O failed while pulling records.
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    /// Shorthand for a Decode error — used at every field
    /// decoding site so the call reads as one line.
    pub fn decode(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            field:  field.into(),
            reason: reason.into(),
        }
    }
}
