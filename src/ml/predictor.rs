// ============================================================
// Layer 5 — Predictor
// ============================================================
// Loads a trained checkpoint and maps a free-text input to a
// predicted language label via the frozen label vocabulary's
// inverse mapping.

use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::labels::LabelVocab;
use crate::data::sample::encode_text;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{LangIdModel, LangIdModelConfig};

type InferBackend = burn::backend::NdArray;

pub struct Predictor {
    model:       LangIdModel<InferBackend>,
    vocab:       LabelVocab,
    max_seq_len: usize,
    device:      burn::backend::ndarray::NdArrayDevice,
}

impl Predictor {
    /// Rebuild the trained model from the checkpoint
    /// directory: architecture from the saved config, weights
    /// from the latest epoch, label space from the saved
    /// vocabulary.
    pub fn from_checkpoint(ckpt: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let cfg    = ckpt.load_config()?;
        let vocab  = ckpt.load_labels()?;

        // Dropout 0.0 — inference never drops activations
        let model_cfg = LangIdModelConfig::new(
            cfg.vocab_size, cfg.max_seq_len, cfg.d_model,
            cfg.num_heads, cfg.num_layers, cfg.d_ff, 0.0,
            vocab.len(),
        );
        let model: LangIdModel<InferBackend> = model_cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint ({} classes)", vocab.len());

        Ok(Self {
            model,
            vocab,
            max_seq_len: cfg.max_seq_len,
            device,
        })
    }

    /// The label space the model was trained against.
    pub fn vocab(&self) -> &LabelVocab {
        &self.vocab
    }

    /// Predict the language of `text`.
    /// Returns the label string and the softmax confidence.
    pub fn predict(&self, text: &str, tokenizer: &Tokenizer) -> Result<(String, f32)> {
        let (input_ids, attention_mask) = encode_text(tokenizer, self.max_seq_len, text)?;

        let ids_flat: Vec<i32>  = input_ids.iter().map(|&x| x as i32).collect();
        let mask_flat: Vec<i32> = attention_mask.iter().map(|&x| x as i32).collect();

        let input_tensor = Tensor::<InferBackend, 1, Int>::from_ints(
            ids_flat.as_slice(), &self.device,
        ).unsqueeze::<2>();
        let mask_tensor = Tensor::<InferBackend, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device,
        ).unsqueeze::<2>();

        let logits = self.model.forward(input_tensor, mask_tensor); // [1, classes]

        let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 1)
            .squeeze::<1>(0)
            .into_data()
            .to_vec::<f32>()
            .unwrap_or_default();

        // Top-1 class and its probability
        let (best_idx, best_prob) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| anyhow::anyhow!("model produced no logits"))?;

        let label = self
            .vocab
            .label_of(best_idx)
            .ok_or_else(|| anyhow::anyhow!("class index {best_idx} outside the label space"))?
            .to_string();

        tracing::debug!("Predicted '{}' with confidence {:.4}", label, best_prob);
        Ok((label, best_prob))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::labels::LabelVocab;
    use crate::infra::metrics::MetricsLogger;
    use crate::infra::tokenizer_store::TokenizerStore;
    use crate::ml::trainer::run_training;
    use crate::schema::metadata::DatasetMetadata;
    use crate::schema::reader::SchemaReader;

    fn inline_reader() -> SchemaReader {
        let json = r#"{
            "name": "bilingual-mini",
            "recordSets": [
                {
                    "name": "train",
                    "recordCount": 4,
                    "fields": [
                        {"name": "sentence", "dataType": "bytes"},
                        {"name": "language", "dataType": "string"}
                    ],
                    "data": [
                        {"sentence": "the croissant is tasty",  "language": "eng"},
                        {"sentence": "butter makes it better",  "language": "eng"},
                        {"sentence": "le croissant est bon",    "language": "fra"},
                        {"sentence": "la vie est belle",        "language": "fra"}
                    ]
                },
                {
                    "name": "test",
                    "recordCount": 2,
                    "fields": [
                        {"name": "sentence", "dataType": "bytes"},
                        {"name": "language", "dataType": "string"}
                    ],
                    "data": [
                        {"sentence": "croissants are tasty",      "language": "eng"},
                        {"sentence": "les croissants sont bons",  "language": "fra"}
                    ]
                }
            ]
        }"#;
        let metadata: DatasetMetadata = serde_json::from_str(json).unwrap();
        SchemaReader::from_metadata(metadata, ".")
    }

    #[test]
    fn test_trained_checkpoint_identifies_free_text() {
        let dir = std::env::temp_dir().join(format!(
            "croissant-langid-e2e-{}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();

        let reader = inline_reader();
        let cfg = TrainConfig {
            checkpoint_dir:   dir.to_string_lossy().to_string(),
            max_seq_len:      8,
            train_batch_size: 2,
            test_batch_size:  2,
            epochs:           1.0,
            eval_fraction:    1.0,
            shuffle_buffer:   4,
            seed:             7,
            lr:               1e-3,
            log_every:        100,
            d_model:          8,
            num_heads:        2,
            num_layers:       1,
            d_ff:             16,
            dropout:          0.0,
            vocab_size:       64,
            ..TrainConfig::default()
        };

        // The same artefacts the train use case persists
        let vocab  = LabelVocab::from_labels(["eng", "fra"]);
        let corpus = vec![
            "the croissant is tasty".to_string(),
            "butter makes it better".to_string(),
            "le croissant est bon".to_string(),
            "la vie est belle".to_string(),
        ];
        let tokenizer = TokenizerStore::new(cfg.checkpoint_dir.clone())
            .load_or_build(&corpus, cfg.vocab_size)
            .unwrap();

        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone());
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_labels(&vocab).unwrap();
        let metrics = MetricsLogger::new(cfg.checkpoint_dir.clone()).unwrap();

        run_training(&cfg, &reader, &vocab, &tokenizer, &ckpt, &metrics).unwrap();

        // Round trip: rebuild the model from the checkpoint and
        // classify free text the training data never contained
        let predictor = Predictor::from_checkpoint(&ckpt).unwrap();
        let (label, confidence) = predictor
            .predict("Croissants are tasty!", &tokenizer)
            .unwrap();

        assert!(
            predictor.vocab().labels().contains(&label),
            "predicted label '{label}' is outside the frozen label space"
        );
        assert!(confidence > 0.0 && confidence <= 1.0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
