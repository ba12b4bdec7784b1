//! Synthetic dataset generation: subjects, state process, synthesis, windowing.

pub mod markov;
pub mod storage;
pub mod subject;
pub mod synth;
pub mod window;

pub use markov::{CognitiveState, StateProcess, StateProcessConfig, TransitionMatrix};
pub use storage::{read_windows, write_windows, DatasetError};
pub use subject::{ProfileRanges, SubjectGroup, SubjectProfile};
pub use synth::{synthesize_trial, Band, BandValues, BurstRule, SynthesisConfig, Trial};
pub use window::{class_counts, window_trial, StateDistribution, Window, WindowerConfig};
