//! Versioned binary persistence for trained artifacts.
//!
//! The classifier network and the feature scaler persist through the
//! [`Checkpointable`] trait, which fixes a deterministic binary codec and a
//! version header convention so incompatible artifacts are rejected at load
//! time instead of silently producing garbage predictions.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;

/// Errors that can occur while saving or loading artifacts.
#[derive(Debug)]
pub enum CheckpointError {
    /// Underlying I/O failure while reading or writing artifact files.
    Io(std::io::Error),
    /// Serialization or deserialization error from the binary codec.
    Serialization(bincode::Error),
    /// The artifact decoded cleanly but carries an incompatible schema version.
    VersionMismatch { expected: u32, found: u32 },
    /// The artifact did not match the expected structure.
    InvalidFormat(String),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "I/O error while accessing artifact: {err}"),
            CheckpointError::Serialization(err) => {
                write!(f, "Failed to (de)serialize artifact payload: {err}")
            }
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "Artifact version mismatch: expected {expected}, found {found}",
            ),
            CheckpointError::InvalidFormat(msg) => {
                write!(f, "Artifact file has invalid structure: {msg}")
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

/// Rejects an artifact whose stored schema version differs from the current one.
pub fn ensure_version(expected: u32, found: u32) -> Result<(), CheckpointError> {
    if expected == found {
        Ok(())
    } else {
        Err(CheckpointError::VersionMismatch { expected, found })
    }
}

/// Deterministic binary codec options shared by all artifact implementations.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_little_endian()
}

/// Components that support deterministic persistence implement this trait.
///
/// Implementations serialize a `(version, payload)` pair and call
/// [`ensure_version`] on load so schema drift surfaces as a typed error.
pub trait Checkpointable: Sized {
    /// Save the current state to `path` using the deterministic codec.
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError>;

    /// Load a state from `path`, replacing any existing instance.
    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError>;

    /// Utility for writing a serializable snapshot with the shared codec.
    fn write_snapshot<P, T>(snapshot: &T, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::Serialize,
    {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        codec().serialize_into(&mut writer, snapshot)?;
        writer.flush()?;
        Ok(())
    }

    /// Utility for reading a serializable snapshot with the shared codec.
    fn read_snapshot<P, T>(path: P) -> Result<T, CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::de::DeserializeOwned,
    {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Ok(codec().deserialize_from(&mut reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    const PROBE_VERSION: u32 = 3;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ProbePayload {
        values: Vec<f32>,
        tag: String,
    }

    struct Probe {
        payload: ProbePayload,
    }

    impl Checkpointable for Probe {
        fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
            Self::write_snapshot(&(PROBE_VERSION, self.payload.clone()), path)
        }

        fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
            let (version, payload): (u32, ProbePayload) = Self::read_snapshot(path)?;
            ensure_version(PROBE_VERSION, version)?;
            Ok(Probe { payload })
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.bin", label, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_snapshot_round_trip() {
        let path = temp_path("checkpoint_round_trip");
        let probe = Probe {
            payload: ProbePayload {
                values: vec![0.25, -1.5, 3.0],
                tag: "fold_2".to_string(),
            },
        };

        probe.save_checkpoint(&path).unwrap();
        let restored = Probe::load_checkpoint(&path).unwrap();
        assert_eq!(restored.payload, probe.payload);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let path = temp_path("checkpoint_stale_version");
        let payload = ProbePayload {
            values: vec![1.0],
            tag: "old".to_string(),
        };
        Probe::write_snapshot(&(PROBE_VERSION + 1, payload), &path).unwrap();

        match Probe::load_checkpoint(&path) {
            Err(CheckpointError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, PROBE_VERSION);
                assert_eq!(found, PROBE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other.is_ok()),
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_maps_to_io_error() {
        let path = temp_path("checkpoint_missing");
        assert!(matches!(
            Probe::load_checkpoint(&path),
            Err(CheckpointError::Io(_))
        ));
    }

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CheckpointError>();
    }
}
