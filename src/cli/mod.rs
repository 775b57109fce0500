// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the classifier from a metadata file
//   2. `predict` — loads a checkpoint and identifies a language
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "croissant-langid",
    version = "0.1.0",
    about = "Train a transformer language identifier from dataset metadata, then classify text."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    /// The handlers take the args by value: matching on
    /// self.command moves them out, so `self` is gone by then.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig, layers the LANGID_*
    /// environment overrides on top, and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::{TrainConfig, TrainUseCase};

        tracing::info!("Starting training from metadata: {}", args.metadata);

        // Convert CLI args → application config (separates presentation from domain)
        let mut config: TrainConfig = args.into();
        config.apply_env_overrides()?;

        let use_case = TrainUseCase::new(config);
        use_case.execute()?;

        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    /// Loads the model from checkpoint and prints the predicted language.
    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;
        use crate::domain::traits::LanguageIdentifier;

        // Build the use case with the checkpoint directory path
        let use_case = PredictUseCase::new(&args.checkpoint_dir)?;

        // Run inference and print the result
        let (label, confidence) = use_case.identify(&args.text)?;
        println!("\n'{}' → {} (confidence {:.1}%)", args.text, label, confidence * 100.0);
        Ok(())
    }
}
