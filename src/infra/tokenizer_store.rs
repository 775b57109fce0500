// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Manages tokenizer construction, saving, and loading.
//
// The tokenizer is built exactly once from the training
// sentences, saved next to the checkpoints, and from then on
// every component that needs it receives the same loaded
// instance by reference — there is no hidden cache.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. The correct approach is to build the
// tokenizer JSON manually and load it, bypassing the trainer
// type mismatch entirely: a word-level vocabulary over the
// multilingual corpus is all a language identifier needs.
//
// Reference: Sennrich et al. (2016) BPE paper

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load existing tokenizer or build a new one from texts.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        let tok_path = self.dir.join("tokenizer.json");
        if tok_path.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from its JSON file.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })
    }

    /// Build a word-level vocabulary from the training
    /// sentences and write a valid tokenizer JSON directly.
    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        let json     = tokenizer_json(texts, vocab_size);
        let tok_path = self.dir.join("tokenizer.json");
        std::fs::write(&tok_path, serde_json::to_string_pretty(&json)?)
            .with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!("Tokenizer built and saved to '{}'", tok_path.display());

        // Load back as a proper Tokenizer instance
        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Build the tokenizer JSON document for a word-level
/// vocabulary over `texts`, in the HuggingFace format that
/// Tokenizer::from_file() expects.
///
/// Words are lowercased, edge punctuation is stripped, and
/// the most frequent words fill the vocabulary up to
/// `vocab_size` minus the reserved special-token slots.
pub fn tokenizer_json(texts: &[String], vocab_size: usize) -> serde_json::Value {
    // ── Step 1: Build vocabulary from word frequencies ────────────────────────
    use std::collections::HashMap;
    let mut freq: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for word in text.split_whitespace() {
            let w = word.to_lowercase();
            let w = w.trim_matches(|c: char| !c.is_alphanumeric());
            if !w.is_empty() {
                *freq.entry(w.to_string()).or_insert(0) += 1;
            }
        }
    }

    // Sort by frequency descending; ties break alphabetically
    // so the vocabulary is deterministic across runs
    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let max_words = vocab_size.saturating_sub(5);
    words.truncate(max_words);

    // ── Step 2: Build vocab JSON ──────────────────────────────────────────────
    // Specials take 0..4 and words continue contiguously from
    // 5, so every assigned ID stays below vocab_size — the
    // token embedding table has exactly vocab_size rows, and a
    // gap-numbered scheme would index past it on a large corpus
    let mut vocab = serde_json::json!({
        "[PAD]":  0,
        "[UNK]":  1,
        "[CLS]":  2,
        "[SEP]":  3,
        "[MASK]": 4,
    });

    let mut next_id = 5usize;
    for (word, _) in &words {
        if vocab.get(word).is_none() {
            debug_assert!(next_id < vocab_size, "token ID {next_id} outside the embedding table");
            vocab[word] = serde_json::json!(next_id);
            next_id += 1;
        }
    }

    // ── Step 3: Assemble the full tokenizer document ──────────────────────────
    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": "[PAD]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 1, "content": "[UNK]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 2, "content": "[CLS]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 3, "content": "[SEP]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 4, "content": "[MASK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": {
            "type": "Whitespace"
        },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Bonjour le monde".to_string(),
            "le monde est grand".to_string(),
        ]
    }

    #[test]
    fn test_tokenizer_json_loads_and_tokenises() {
        let json = tokenizer_json(&corpus(), 64);
        let tok  = Tokenizer::from_bytes(serde_json::to_vec(&json).unwrap()).unwrap();

        let enc = tok.encode("le monde", false).unwrap();
        assert_eq!(enc.get_ids().len(), 2);
        // Known words never map to [UNK]
        assert!(enc.get_ids().iter().all(|&id| id != 1));
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let json = tokenizer_json(&corpus(), 64);
        let tok  = Tokenizer::from_bytes(serde_json::to_vec(&json).unwrap()).unwrap();

        let enc = tok.encode("zzzzz", false).unwrap();
        assert_eq!(enc.get_ids(), &[1]);
    }

    #[test]
    fn test_vocabulary_is_deterministic() {
        let a = tokenizer_json(&corpus(), 64);
        let b = tokenizer_json(&corpus(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_ids_stay_below_the_vocab_size() {
        // Far more distinct words than the budget allows — every
        // assigned ID must still fit the embedding table
        let vocab_size = 200;
        let corpus = vec![(0..300)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")];

        let json  = tokenizer_json(&corpus, vocab_size);
        let vocab = json["model"]["vocab"].as_object().unwrap();

        let max_id = vocab
            .values()
            .map(|v| v.as_u64().unwrap() as usize)
            .max()
            .unwrap();
        assert!(max_id < vocab_size, "max token ID {max_id} >= {vocab_size}");
        assert_eq!(vocab.len(), vocab_size);
    }

    #[test]
    fn test_vocab_size_budget_is_respected() {
        // 3 distinct words but a budget of 5 + 1 word slot
        let json  = tokenizer_json(&corpus(), 6);
        let vocab = &json["model"]["vocab"];
        // 5 special tokens + at most 1 corpus word
        assert!(vocab.as_object().unwrap().len() <= 6);
    }
}
