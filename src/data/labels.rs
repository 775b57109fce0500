// ============================================================
// Layer 4 — Label Vocabulary
// ============================================================
// The classification label space: a bijection between the
// distinct language labels seen in the training record set
// and the integer class indices the model trains against.
//
// Determinism matters here: the mapping is built by sorting
// the distinct labels, so re-running over the same training
// data always yields the identical mapping. The vocabulary is
// frozen before training begins and reused unchanged for
// evaluation and inference — it is saved next to the model
// checkpoint and loaded back by the predictor.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §10 (Derive Macros)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::error::DataError;

/// Frozen label ↔ class-index bijection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelVocab {
    /// Class index → label string (sorted label order)
    labels: Vec<String>,

    /// Label string → class index (the inverse direction)
    index: BTreeMap<String, usize>,
}

impl LabelVocab {
    /// Build the vocabulary from every label observed in the
    /// training data. Duplicates collapse; the distinct labels
    /// are sorted and then numbered 0..n.
    pub fn from_labels<I, T>(labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        // BTreeSet both de-duplicates and sorts
        let distinct: BTreeSet<String> = labels.into_iter().map(Into::into).collect();

        let labels: Vec<String> = distinct.into_iter().collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();

        Self { labels, index }
    }

    /// The class index of a label, or None for a label the
    /// training data never contained.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Like index_of, but with the pipeline's typed error —
    /// an unseen label at encode time is fatal to the run.
    pub fn require_index(&self, label: &str) -> Result<usize, DataError> {
        self.index_of(label).ok_or_else(|| {
            DataError::InvalidArgument(format!(
                "label '{label}' was not present in the training data"
            ))
        })
    }

    /// The label string for a class index (inference-time
    /// inverse of index_of).
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in class-index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse_and_sort() {
        // Labels {"a","b","a"} must map to {"a":0, "b":1}
        // with the exact inverse
        let vocab = LabelVocab::from_labels(["a", "b", "a"]);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.index_of("a"), Some(0));
        assert_eq!(vocab.index_of("b"), Some(1));
        assert_eq!(vocab.label_of(0), Some("a"));
        assert_eq!(vocab.label_of(1), Some("b"));
    }

    #[test]
    fn test_mapping_ignores_observation_order() {
        let forward  = LabelVocab::from_labels(["deu", "eng", "fra"]);
        let backward = LabelVocab::from_labels(["fra", "eng", "deu"]);
        assert_eq!(forward.labels(), backward.labels());
        assert_eq!(forward.index_of("eng"), backward.index_of("eng"));
    }

    #[test]
    fn test_bijection_round_trips() {
        let vocab = LabelVocab::from_labels(["fra", "eng", "deu", "fin"]);
        for i in 0..vocab.len() {
            let label = vocab.label_of(i).unwrap();
            assert_eq!(vocab.index_of(label), Some(i));
        }
    }

    #[test]
    fn test_unseen_label_is_an_error() {
        let vocab = LabelVocab::from_labels(["eng"]);
        assert!(vocab.index_of("xyz").is_none());
        assert!(matches!(
            vocab.require_index("xyz"),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_survives_a_serde_round_trip() {
        let vocab = LabelVocab::from_labels(["fra", "eng"]);
        let json  = serde_json::to_string(&vocab).unwrap();
        let back: LabelVocab = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index_of("fra"), vocab.index_of("fra"));
        assert_eq!(back.labels(), vocab.labels());
    }
}
