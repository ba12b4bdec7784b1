use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::dataset::SubjectGroup;

fn log_dir() -> io::Result<()> {
    fs::create_dir_all("logs")
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[derive(Debug, Serialize)]
pub struct GenerationLogEntry {
    pub subject: usize,
    pub group: SubjectGroup,
    pub windows: usize,
    pub class_counts: [usize; 3],
    pub timestamp_ms: u128,
}

pub fn log_subject_generation(
    subject: usize,
    group: SubjectGroup,
    windows: usize,
    class_counts: [usize; 3],
) -> io::Result<()> {
    log_dir()?;
    let entry = GenerationLogEntry {
        subject,
        group,
        windows,
        class_counts,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line("logs/generation.jsonl", &entry)
}

#[derive(Debug, Serialize)]
pub struct FoldLogEntry {
    pub fold: usize,
    pub train_windows: usize,
    pub test_windows: usize,
    pub bursts_run: usize,
    pub best_loss: f32,
    pub accuracy: f32,
    pub timestamp_ms: u128,
}

pub fn log_fold_outcome(outcome: &crate::trainer::FoldOutcome) -> io::Result<()> {
    log_dir()?;
    let entry = FoldLogEntry {
        fold: outcome.fold,
        train_windows: outcome.train_windows,
        test_windows: outcome.test_windows,
        bursts_run: outcome.bursts.len(),
        best_loss: outcome.best_loss,
        accuracy: outcome.accuracy,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line("logs/training.jsonl", &entry)
}
