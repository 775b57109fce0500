// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Hyperparameter tuning is deliberately NOT done with flags:
// the run knobs (sequence length, batch sizes, epochs, eval
// fraction) are read from LANGID_* environment variables on
// top of the built-in defaults. See train_use_case.rs.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the language identifier from a dataset metadata file
    Train(TrainArgs),

    /// Identify the language of a sentence using a trained checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the dataset metadata JSON document
    #[arg(long, default_value = "data/croissant.json")]
    pub metadata: String,

    /// Directory to save model checkpoints, tokenizer, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Name of the record set to train on
    #[arg(long, default_value = "train")]
    pub train_set: String,

    /// Name of the record set to evaluate on
    #[arg(long, default_value = "test")]
    pub test_set: String,

    /// Record field holding the sentence text
    #[arg(long, default_value = "sentence")]
    pub text_field: String,

    /// Record field holding the language label
    #[arg(long, default_value = "language")]
    pub label_field: String,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types. Everything the
/// flags don't cover keeps its default until the environment
/// overrides are applied.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            metadata_path:    a.metadata,
            checkpoint_dir:   a.checkpoint_dir,
            train_record_set: a.train_set,
            test_record_set:  a.test_set,
            text_field:       a.text_field,
            label_field:      a.label_field,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The sentence whose language should be identified
    #[arg(long, default_value = "Croissants are tasty!")]
    pub text: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
