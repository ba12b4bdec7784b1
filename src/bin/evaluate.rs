//! Evaluates saved artifacts against a window dataset.
//!
//! Loads the model and scaler, runs every window through the same path the
//! prediction service uses, and prints accuracy, the confusion matrix, and
//! per-class confidence statistics.
//!
//! # Usage
//!
//! ```bash
//! evaluate
//! evaluate --config config/pipeline.toml --dataset /tmp/holdout.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cognitive_state_core::dataset::{read_windows, CognitiveState};
use cognitive_state_core::eval::evaluate_dataset;
use cognitive_state_core::model::LoadedModel;
use cognitive_state_core::scaler::FeatureScaler;
use cognitive_state_core::{Checkpointable, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(about = "Evaluate saved artifacts on a window dataset", long_about = None)]
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

    let model = LoadedModel::load(&config.artifacts.model_path)?;
    let scaler = FeatureScaler::load_checkpoint(&config.artifacts.scaler_path)?;
    let windows = read_windows(&dataset_path)?;
    info!(
        "Loaded {} windows from {}",
        windows.len(),
        dataset_path.display()
    );

    let report = evaluate_dataset(&model, &scaler, &windows, config.dataset.sample_rate)?;

    println!();
    println!(
        "Evaluated {} windows: {} correct ({:.2}%)",
        report.total,
        report.correct,
        report.accuracy * 100.0
    );
    println!();

    println!("Confusion matrix (rows actual, columns predicted):");
    print!("{:>10}", "");
    for state in CognitiveState::all() {
        print!("{:>10}", state.label());
    }
    println!();
    for actual in CognitiveState::all() {
        print!("{:>10}", actual.label());
        for predicted in CognitiveState::all() {
            print!("{:>10}", report.confusion.count(actual, predicted));
        }
        println!();
    }
    println!();

    println!("Confidence of the predicted class, grouped by true class:");
    println!(
        "{:>10} {:>7} {:>7} {:>7} {:>8} {:>8}",
        "class", "count", "mean", "std", ">0.90", "<0.50"
    );
    for state in CognitiveState::all() {
        let stats = &report.confidence[state.index()];
        println!(
            "{:>10} {:>7} {:>7.3} {:>7.3} {:>7.1}% {:>7.1}%",
            state.label(),
            stats.count,
            stats.mean,
            stats.std,
            stats.frac_above_090 * 100.0,
            stats.frac_below_050 * 100.0,
        );
    }

    Ok(())
}
