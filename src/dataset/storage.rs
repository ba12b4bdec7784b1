//! Dataset persistence
//!
//! Windows are stored as one JSON array using the wire fields `input`,
//! `label`, `soft` and `subject`. The file is written once by the generator
//! and read back by the trainer and evaluator.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::window::Window;

/// Errors raised at the dataset file boundary
#[derive(Debug)]
pub enum DatasetError {
    /// Underlying I/O failure while reading or writing the dataset file
    Io(std::io::Error),
    /// Malformed JSON or records that do not match the wire format
    Json(serde_json::Error),
    /// The file parsed correctly but holds no windows
    Empty,
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "I/O error while accessing dataset: {err}"),
            DatasetError::Json(err) => write!(f, "Failed to (de)serialize dataset: {err}"),
            DatasetError::Empty => write!(f, "Dataset file holds no windows"),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Json(err)
    }
}

/// Write all windows to `path` as a single JSON array
pub fn write_windows<P: AsRef<Path>>(windows: &[Window], path: P) -> Result<(), DatasetError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), windows)?;
    Ok(())
}

/// Read a non-empty window set from `path`
pub fn read_windows<P: AsRef<Path>>(path: P) -> Result<Vec<Window>, DatasetError> {
    let file = File::open(path)?;
    let windows: Vec<Window> = serde_json::from_reader(BufReader::new(file))?;
    if windows.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::markov::CognitiveState;
    use crate::dataset::window::StateDistribution;
    use std::path::PathBuf;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cogstate_{}_{}.json", tag, uuid::Uuid::new_v4()))
    }

    fn sample_window(subject: usize) -> Window {
        Window {
            channels: vec![vec![0.5; 8]; 4],
            label: CognitiveState::Calm,
            soft: StateDistribution::from_array([0.2, 0.7, 0.1]),
            subject,
        }
    }

    #[test]
    fn test_windows_round_trip() {
        let path = temp_path("roundtrip");
        let windows = vec![sample_window(0), sample_window(3)];

        write_windows(&windows, &path).expect("write should succeed");
        let loaded = read_windows(&path).expect("read should succeed");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].label, CognitiveState::Calm);
        assert_eq!(loaded[1].subject, 3);
        assert!((loaded[0].soft.calm - 0.7).abs() < 1e-6);
        assert_eq!(loaded[0].channels, windows[0].channels);
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_string(&sample_window(5)).expect("serialize");
        assert!(json.contains("\"input\""));
        assert!(json.contains("\"label\":\"calm\""));
        assert!(json.contains("\"soft\""));
        assert!(json.contains("\"attentive\""));
        assert!(json.contains("\"subject\":5"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = temp_path("missing");
        match read_windows(&path) {
            Err(DatasetError::Io(_)) => {}
            other => panic!("expected Io error, got {:?}", other.map(|w| w.len())),
        }
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let path = temp_path("empty");
        write_windows(&[], &path).expect("write should succeed");
        let result = read_windows(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(DatasetError::Empty)));
    }
}
