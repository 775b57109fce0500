// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Orchestrates inference on free text:
//
//   Step 1: Load the saved tokenizer      (Layer 6 - infra)
//   Step 2: Rebuild model from checkpoint (Layer 5 - ml)
//   Step 3: Tokenize + classify the input (Layer 5 - ml)
//
// Loading happens once in the constructor; identify() can then
// be called repeatedly without touching the disk again.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::domain::traits::LanguageIdentifier;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::predictor::Predictor;

pub struct PredictUseCase {
    tokenizer: Tokenizer,
    predictor: Predictor,
}

impl PredictUseCase {
    /// Load everything inference needs from the checkpoint
    /// directory. Fails with a pointer to 'train' if no run
    /// has been saved there yet.
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let tokenizer = TokenizerStore::new(checkpoint_dir).load()?;
        let predictor = Predictor::from_checkpoint(&CheckpointManager::new(checkpoint_dir))?;
        Ok(Self { tokenizer, predictor })
    }

    /// Number of languages the loaded model can distinguish.
    pub fn num_languages(&self) -> usize {
        self.predictor.vocab().len()
    }
}

impl LanguageIdentifier for PredictUseCase {
    fn identify(&self, text: &str) -> Result<(String, f32)> {
        self.predictor.predict(text, &self.tokenizer)
    }
}
