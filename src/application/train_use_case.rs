// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the metadata document    (Layer 4 - schema)
//   Step 2: Freeze the label vocabulary   (Layer 4 - data)
//   Step 3: Build / load the tokenizer    (Layer 6 - infra)
//   Step 4: Save config + label space     (Layer 6 - infra)
//   Step 5: Run training / evaluation     (Layer 5 - ml)
//
// Everything the training loop needs — the label mapping, the
// tokenizer, the hyperparameters — is built here once and
// passed in explicitly. No process-wide state, no hidden
// caches: two use cases with different configs can run side
// by side.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::data::{
    adapter::{FieldRead, RecordSetAdapter},
    labels::LabelVocab,
};
use crate::domain::error::DataError;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::run_training;
use crate::schema::reader::SchemaReader;

// ─── Environment overrides ────────────────────────────────────────────────────
// The five knobs the run is tuned with, recognised as
// environment variables on top of the defaults below.
pub const ENV_MAX_SEQ_LEN:      &str = "LANGID_MAX_SEQ_LEN";
pub const ENV_TRAIN_BATCH_SIZE: &str = "LANGID_TRAIN_BATCH_SIZE";
pub const ENV_TEST_BATCH_SIZE:  &str = "LANGID_TEST_BATCH_SIZE";
pub const ENV_EPOCHS:           &str = "LANGID_EPOCHS";
pub const ENV_EVAL_FRACTION:    &str = "LANGID_EVAL_FRACTION";

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub metadata_path:    String,
    pub checkpoint_dir:   String,
    pub train_record_set: String,
    pub test_record_set:  String,
    pub text_field:       String,
    pub label_field:      String,
    pub max_seq_len:      usize,
    pub train_batch_size: usize,
    pub test_batch_size:  usize,
    /// May be fractional: 2.5 = two full passes plus half a pass
    pub epochs:           f64,
    /// Fraction of the evaluation set to run each pass, in [0, 1]
    pub eval_fraction:    f64,
    pub shuffle_buffer:   usize,
    pub seed:             u64,
    pub lr:               f64,
    pub log_every:        usize,
    pub d_model:          usize,
    pub num_heads:        usize,
    pub num_layers:       usize,
    pub d_ff:             usize,
    pub dropout:          f64,
    pub vocab_size:       usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            metadata_path:    "data/croissant.json".to_string(),
            checkpoint_dir:   "checkpoints".to_string(),
            train_record_set: "train".to_string(),
            test_record_set:  "test".to_string(),
            text_field:       "sentence".to_string(),
            label_field:      "language".to_string(),
            max_seq_len:      128,
            train_batch_size: 16,
            test_batch_size:  32,
            epochs:           1.0,
            eval_fraction:    1.0,
            shuffle_buffer:   1000,
            seed:             42,
            lr:               1e-4,
            log_every:        25,
            d_model:          256,
            num_heads:        8,
            num_layers:       4,
            d_ff:             1024,
            dropout:          0.1,
            vocab_size:       30522,
        }
    }
}

impl TrainConfig {
    /// Apply the recognised environment overrides on top of
    /// the current values. Malformed values fail fast instead
    /// of being silently ignored.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as apply_env_overrides, but reading from any
    /// key → value lookup. Split out so tests don't have to
    /// mutate the process environment.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = parse_override(&get, ENV_MAX_SEQ_LEN)? {
            self.max_seq_len = v;
        }
        if let Some(v) = parse_override(&get, ENV_TRAIN_BATCH_SIZE)? {
            self.train_batch_size = v;
        }
        if let Some(v) = parse_override(&get, ENV_TEST_BATCH_SIZE)? {
            self.test_batch_size = v;
        }
        if let Some(v) = parse_override(&get, ENV_EPOCHS)? {
            self.epochs = v;
        }
        if let Some(v) = parse_override(&get, ENV_EVAL_FRACTION)? {
            self.eval_fraction = v;
        }
        self.validate()
    }

    /// Range checks that keep the loop arithmetic safe.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_len == 0 {
            bail!("max_seq_len must be >= 1");
        }
        if self.train_batch_size == 0 || self.test_batch_size == 0 {
            bail!("batch sizes must be >= 1");
        }
        // NaN and infinity both slip past a plain `< 0.0` check;
        // infinity would plan an unbounded number of passes
        if !self.epochs.is_finite() || self.epochs < 0.0 {
            bail!("epochs must be a finite number >= 0 (0 is a no-op run)");
        }
        if !(0.0..=1.0).contains(&self.eval_fraction) {
            bail!("eval_fraction must be within [0, 1]");
        }
        if self.log_every == 0 {
            bail!("log_every must be >= 1");
        }
        Ok(())
    }
}

/// Read and parse one override. A present-but-malformed value
/// is an error; an absent one leaves the default untouched.
fn parse_override<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => {
            let value = raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}"))?;
            tracing::info!("Override from {}: {}", key, raw);
            Ok(Some(value))
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load the metadata document ────────────────────────────────
        let reader = SchemaReader::from_file(&cfg.metadata_path)?;

        // ── Step 2: Freeze the label vocabulary ───────────────────────────────
        // One full pass over the training labels, before any
        // training step runs — evaluation and inference reuse
        // this exact mapping unchanged.
        let labels = collect_text_field(&reader, &cfg.train_record_set, &cfg.label_field)?;
        let vocab  = LabelVocab::from_labels(labels);
        if vocab.is_empty() {
            bail!(
                "record set '{}' contains no labels in field '{}'",
                cfg.train_record_set, cfg.label_field
            );
        }
        tracing::info!("Label space frozen: {} distinct languages", vocab.len());

        // ── Step 3: Build / load the tokenizer ────────────────────────────────
        // Built once from the training sentences, then passed
        // by reference into everything that tokenises.
        let corpus    = collect_text_field(&reader, &cfg.train_record_set, &cfg.text_field)?;
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.load_or_build(&corpus, cfg.vocab_size)?;

        // ── Step 4: Save config + label space for inference ───────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(cfg)?;
        ckpt.save_labels(&vocab)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 5: Run the training / evaluation loop ────────────────────────
        run_training(cfg, &reader, &vocab, &tokenizer, &ckpt, &metrics)?;

        Ok(())
    }
}

/// Pull one decoded text field out of every record of a
/// record set, in source order.
fn collect_text_field(
    reader: &SchemaReader,
    record_set: &str,
    field: &str,
) -> Result<Vec<String>> {
    let adapter = RecordSetAdapter::new(
        reader,
        record_set,
        vec![(field.to_string(), FieldRead::Utf8Text)],
    )?;

    let mut values = Vec::new();
    for record in adapter.records()? {
        let record = record?;
        let value = record
            .get(field)
            .and_then(|v| v.as_text())
            .ok_or_else(|| DataError::decode(field, "expected decoded text"))?;
        values.push(value.to_string());
    }
    Ok(values)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let mut cfg = TrainConfig::default();
        let env = overrides(&[
            (ENV_MAX_SEQ_LEN, "64"),
            (ENV_TRAIN_BATCH_SIZE, "8"),
            (ENV_TEST_BATCH_SIZE, "4"),
            (ENV_EPOCHS, "2.5"),
            (ENV_EVAL_FRACTION, "0.25"),
        ]);

        cfg.apply_overrides(|k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.max_seq_len, 64);
        assert_eq!(cfg.train_batch_size, 8);
        assert_eq!(cfg.test_batch_size, 4);
        assert_eq!(cfg.epochs, 2.5);
        assert_eq!(cfg.eval_fraction, 0.25);
    }

    #[test]
    fn test_absent_overrides_leave_defaults() {
        let mut cfg = TrainConfig::default();
        let before = cfg.clone();
        cfg.apply_overrides(|_| None).unwrap();
        assert_eq!(cfg.max_seq_len, before.max_seq_len);
        assert_eq!(cfg.epochs, before.epochs);
    }

    #[test]
    fn test_malformed_override_fails_fast() {
        let mut cfg = TrainConfig::default();
        let env = overrides(&[(ENV_EPOCHS, "two")]);
        assert!(cfg.apply_overrides(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_out_of_range_fraction_is_rejected() {
        let mut cfg = TrainConfig::default();
        let env = overrides(&[(ENV_EVAL_FRACTION, "1.5")]);
        assert!(cfg.apply_overrides(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_non_finite_epochs_are_rejected() {
        for bad in ["inf", "-inf", "NaN"] {
            let mut cfg = TrainConfig::default();
            let env = overrides(&[(ENV_EPOCHS, bad)]);
            assert!(
                cfg.apply_overrides(|k| env.get(k).cloned()).is_err(),
                "epochs = {bad} must fail validation"
            );
        }
    }

    #[test]
    fn test_zero_log_every_is_rejected() {
        let mut cfg = TrainConfig::default();
        cfg.log_every = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_epochs_is_allowed() {
        let mut cfg = TrainConfig::default();
        let env = overrides(&[(ENV_EPOCHS, "0")]);
        cfg.apply_overrides(|k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.epochs, 0.0);
    }
}
