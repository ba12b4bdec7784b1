//! Generates the synthetic EEG window dataset.
//!
//! Each subject gets one continuous recording driven by a hidden state walk.
//! The recording is sliced into one-second windows with soft labels and the
//! full set is written as a single JSON array.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 20 subjects, 60 s at 128 Hz, data/eeg_cognitive_states.json
//! generate
//!
//! # Custom configuration and output location
//! generate --config config/pipeline.toml --output /tmp/windows.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cognitive_state_core::dataset::{
    class_counts, synthesize_trial, window_trial, write_windows, SubjectGroup, SubjectProfile,
    Window,
};
use cognitive_state_core::{logging, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Generate the synthetic EEG window dataset", long_about = None)]
struct Cli {
    /// Path to the pipeline TOML configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the dataset here instead of the configured path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the generation seed from the configuration
    #[arg(short, long)]
    seed: Option<u64>,
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
    let output = cli
        .output
        .unwrap_or_else(|| config.artifacts.dataset_path.clone());

    let synthesis = config.synthesis_config();
    let windower = config.windower_config();
    let seed = cli.seed.unwrap_or(config.dataset.seed);
    let mut rng = StdRng::seed_from_u64(seed);

    info!(
        "Generating {} subjects, {} s at {} Hz, {} channels",
        config.dataset.subjects,
        config.dataset.trial_secs,
        config.dataset.sample_rate,
        synthesis.channel_count()
    );

    let mut all_windows: Vec<Window> = Vec::new();
    for subject in 0..config.dataset.subjects {
        let group = SubjectGroup::for_index(subject, config.dataset.deficit_start);
        let profile = SubjectProfile::generate(subject, group, &mut rng);
        let trial = synthesize_trial(&profile, &synthesis, &mut rng);
        let windows = window_trial(&trial, &windower, &mut rng);
        let counts = class_counts(&windows);

        info!(
            "Subject {:2} ({:?}): {} windows (attentive {}, calm {}, drowsy {})",
            subject,
            group,
            windows.len(),
            counts[0],
            counts[1],
            counts[2],
        );
        if let Err(err) = logging::log_subject_generation(subject, group, windows.len(), counts) {
            tracing::warn!("Failed to append generation log: {}", err);
        }

        all_windows.extend(windows);
    }

    let totals = class_counts(&all_windows);
    write_windows(&all_windows, &output)?;
    info!(
        "Wrote {} windows to {} (attentive {}, calm {}, drowsy {})",
        all_windows.len(),
        output.display(),
        totals[0],
        totals[1],
        totals[2],
    );

    Ok(())
}
