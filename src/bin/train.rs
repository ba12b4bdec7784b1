//! Trains the cognitive-state classifier.
//!
//! Runs subject-level cross-validation over the window dataset, prints the
//! per-fold results, then fits the final model on every window and saves the
//! model and scaler artifacts.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: data/eeg_cognitive_states.json, 5 folds, artifacts under models/
//! train
//!
//! # Custom configuration
//! train --config config/pipeline.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cognitive_state_core::dataset::read_windows;
use cognitive_state_core::trainer::run_training;
use cognitive_state_core::{Checkpointable, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train the cognitive-state classifier", long_about = None)]
struct Cli {
    /// Path to the pipeline TOML configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the dataset from here instead of the configured path
    #[arg(short, long)]
    dataset: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path)?,
        None => PipelineConfig::default(),
    };
    let dataset_path = cli
        .dataset
        .unwrap_or_else(|| config.artifacts.dataset_path.clone());

    let windows = read_windows(&dataset_path)?;
    info!(
        "Loaded {} windows from {}",
        windows.len(),
        dataset_path.display()
    );

    let pipeline = run_training(&windows, &config.trainer_config())?;

    println!();
    println!(
        "{:>5} {:>8} {:>8} {:>7} {:>10} {:>9}",
        "fold", "train", "test", "bursts", "best loss", "accuracy"
    );
    for fold in &pipeline.report.folds {
        println!(
            "{:>5} {:>8} {:>8} {:>7} {:>10.5} {:>8.2}%{}",
            fold.fold,
            fold.train_windows,
            fold.test_windows,
            fold.bursts.len(),
            fold.best_loss,
            fold.accuracy * 100.0,
            if fold.stopped_early { "  (early)" } else { "" },
        );
    }
    println!(
        "Mean accuracy: {:.2}% (std {:.2}%)",
        pipeline.report.mean_accuracy * 100.0,
        pipeline.report.std_accuracy * 100.0
    );
    println!();

    pipeline.model.save_checkpoint(&config.artifacts.model_path)?;
    pipeline.scaler.save_checkpoint(&config.artifacts.scaler_path)?;
    info!(
        "Saved model to {} and scaler to {}",
        config.artifacts.model_path.display(),
        config.artifacts.scaler_path.display()
    );

    Ok(())
}
