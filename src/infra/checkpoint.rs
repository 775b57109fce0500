// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved per checkpoint:
//   1. Model weights (.mpk.gz file) — all learned parameters
//   2. latest_epoch.json            — which epoch was last saved
//   3. train_config.json            — model architecture config
//   4. label_vocab.json             — the frozen label space
//
// Why save the config and vocabulary separately?
//   When loading for inference, we need the exact model
//   architecture (d_model, num_layers, number of classes) to
//   rebuild the model before loading the weights into it, and
//   the exact label ↔ index mapping to turn an argmax back
//   into a language code. Without both, the weights are
//   useless.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if architecture doesn't match
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after pass 1
//     model_epoch_2.mpk.gz   ← weights after pass 2
//     ...
//     latest_epoch.json      ← number of the latest pass
//     train_config.json      ← model hyperparameters
//     label_vocab.json       ← frozen label mapping
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::data::labels::LabelVocab;
use crate::ml::model::LangIdModel;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save model weights for a given epoch and advance the
    /// latest-epoch pointer.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model: &LangIdModel<B>,
        epoch: usize,
    ) -> Result<()> {
        // Recorder appends the extension itself
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load model weights from the latest saved checkpoint.
    /// The model parameter must have the architecture the
    /// checkpoint was saved with, or loading fails.
    pub fn load_model<B: Backend>(
        &self,
        model:  LangIdModel<B>,
        device: &B::Device,
    ) -> Result<LangIdModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration so the predictor can
    /// rebuild the exact model architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration back.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist the frozen label vocabulary. Must happen before
    /// training starts so evaluation and inference reuse the
    /// identical mapping.
    pub fn save_labels(&self, vocab: &LabelVocab) -> Result<()> {
        let path = self.dir.join("label_vocab.json");
        fs::write(&path, serde_json::to_string_pretty(vocab)?)
            .with_context(|| format!("Cannot write label vocab to '{}'", path.display()))?;
        tracing::debug!("Saved {} labels to '{}'", vocab.len(), path.display());
        Ok(())
    }

    /// Load the frozen label vocabulary back.
    pub fn load_labels(&self) -> Result<LabelVocab> {
        let path = self.dir.join("label_vocab.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read label vocab from '{}'. Have you run 'train' first?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json and return the epoch number.
    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ckpt(tag: &str) -> (CheckpointManager, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "croissant-langid-ckpt-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).ok();
        (
            CheckpointManager::new(dir.to_string_lossy().to_string()),
            dir,
        )
    }

    #[test]
    fn test_labels_round_trip() {
        let (ckpt, dir) = temp_ckpt("labels");
        let vocab = LabelVocab::from_labels(["fra", "eng", "deu"]);

        ckpt.save_labels(&vocab).unwrap();
        let loaded = ckpt.load_labels().unwrap();
        assert_eq!(loaded.labels(), vocab.labels());
        assert_eq!(loaded.index_of("deu"), vocab.index_of("deu"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_config_round_trip() {
        let (ckpt, dir) = temp_ckpt("config");
        let cfg = TrainConfig::default();

        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.max_seq_len, cfg.max_seq_len);
        assert_eq!(loaded.d_model, cfg.d_model);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_loading_without_training_fails() {
        let (ckpt, dir) = temp_ckpt("untrained");
        assert!(ckpt.latest_epoch().is_err());
        std::fs::remove_dir_all(dir).ok();
    }
}
