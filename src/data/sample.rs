// ============================================================
// Layer 4 — Sample Encoding
// ============================================================
// The per-record map function of the pipeline: turns one
// decoded record into a fully tokenised, padded training
// sample. This is the only place where text meets the
// tokenizer on the data side.
//
// Encoding steps:
//   1. Tokenise the sentence field
//   2. Truncate to max_seq_len token IDs
//   3. Build the attention mask (1 = real token, 0 = padding)
//   4. Pad both vectors to exactly max_seq_len
//   5. Map the language label to its frozen class index
//
// All samples leave here with the same length, so the batcher
// can stack them into [batch, seq_len] tensors without any
// dynamic padding.
//
// Reference: Rust Book §8 (Vectors)
//            tokenizers crate documentation

use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::labels::LabelVocab;
use crate::domain::error::DataError;
use crate::domain::record::Record;

/// Token ID used to pad sequences up to max_seq_len.
/// Matches the [PAD] entry of the stored tokenizer.
pub const PAD_ID: u32 = 0;

/// One fully tokenised and padded language-ID sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LangIdSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

impl LangIdSample {
    /// Number of real (non-padding) tokens in the sample.
    pub fn token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Tokenise, truncate and pad one piece of text.
/// Returns (input_ids, attention_mask), both max_seq_len long.
pub fn encode_text(
    tokenizer:   &Tokenizer,
    max_seq_len: usize,
    text:        &str,
) -> Result<(Vec<u32>, Vec<u32>), DataError> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| DataError::decode("sentence", format!("tokeniser error: {e}")))?;

    let mut input_ids: Vec<u32> = encoding.get_ids().to_vec();
    input_ids.truncate(max_seq_len);

    let mut attention_mask = vec![1u32; input_ids.len()];
    while input_ids.len() < max_seq_len {
        input_ids.push(PAD_ID);
        attention_mask.push(0);
    }

    Ok((input_ids, attention_mask))
}

/// The pipeline's map function: decoded record → sample.
///
/// The text field must already be decoded text (the adapter's
/// Utf8Text read takes care of that upstream); the label field
/// must be a label the frozen vocabulary knows.
pub fn encode_record(
    tokenizer:   &Tokenizer,
    vocab:       &LabelVocab,
    max_seq_len: usize,
    text_field:  &str,
    label_field: &str,
    record:      &Record,
) -> Result<LangIdSample, DataError> {
    let text = record
        .get(text_field)
        .and_then(|v| v.as_text())
        .ok_or_else(|| {
            DataError::decode(text_field, "expected decoded text in the record")
        })?;

    let label = record
        .get(label_field)
        .and_then(|v| v.as_text())
        .ok_or_else(|| {
            DataError::decode(label_field, "expected a text label in the record")
        })?;

    let (input_ids, attention_mask) = encode_text(tokenizer, max_seq_len, text)?;
    let label = vocab.require_index(label)?;

    Ok(LangIdSample {
        input_ids,
        attention_mask,
        label,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldValue;
    use crate::infra::tokenizer_store::tokenizer_json;

    fn tiny_tokenizer() -> Tokenizer {
        let corpus = vec![
            "bonjour le monde".to_string(),
            "hello world".to_string(),
            "hallo welt".to_string(),
        ];
        let json = tokenizer_json(&corpus, 64);
        Tokenizer::from_bytes(serde_json::to_vec(&json).unwrap()).unwrap()
    }

    #[test]
    fn test_encode_pads_to_max_seq_len() {
        let tok = tiny_tokenizer();
        let (ids, mask) = encode_text(&tok, 8, "hello world").unwrap();
        assert_eq!(ids.len(), 8);
        assert_eq!(mask.len(), 8);
        // Two real tokens, six pads
        assert_eq!(mask, vec![1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&ids[2..], &[PAD_ID; 6]);
    }

    #[test]
    fn test_encode_truncates_long_text() {
        let tok = tiny_tokenizer();
        let (ids, mask) = encode_text(&tok, 2, "bonjour le monde").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(mask, vec![1, 1]);
    }

    #[test]
    fn test_encode_record_maps_the_label() {
        let tok   = tiny_tokenizer();
        let vocab = LabelVocab::from_labels(["deu", "eng", "fra"]);

        let mut record = Record::new();
        record.insert("sentence", FieldValue::Text("hello world".into()));
        record.insert("language", FieldValue::Text("eng".into()));

        let sample =
            encode_record(&tok, &vocab, 8, "sentence", "language", &record).unwrap();
        assert_eq!(sample.label, vocab.index_of("eng").unwrap());
        assert_eq!(sample.token_count(), 2);
    }

    #[test]
    fn test_encode_record_rejects_undecoded_bytes() {
        let tok   = tiny_tokenizer();
        let vocab = LabelVocab::from_labels(["eng"]);

        // Text field still raw bytes → the adapter step was skipped
        let mut record = Record::new();
        record.insert("sentence", FieldValue::Bytes(b"hello".to_vec()));
        record.insert("language", FieldValue::Text("eng".into()));

        let err = encode_record(&tok, &vocab, 8, "sentence", "language", &record)
            .unwrap_err();
        assert!(matches!(err, DataError::Decode { .. }));
    }

    #[test]
    fn test_encode_record_rejects_unseen_label() {
        let tok   = tiny_tokenizer();
        let vocab = LabelVocab::from_labels(["eng"]);

        let mut record = Record::new();
        record.insert("sentence", FieldValue::Text("hello".into()));
        record.insert("language", FieldValue::Text("fra".into()));

        let err = encode_record(&tok, &vocab, 8, "sentence", "language", &record)
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidArgument(_)));
    }
}
