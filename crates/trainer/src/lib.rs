//! IPL predictor trainer
//!
//! Loads historical match records from CSV, fits the categorical win
//! probability pipeline and writes its artifacts.

pub mod dataset;
pub mod errors;
pub mod trainer;

use ipl_predictor_core::{ArtifactPaths, TrainingParams};
use std::path::Path;

pub use dataset::{load_matches, read_matches};
pub use errors::TrainerError;
pub use trainer::{FittedModel, MatchTrainer, TrainingOutcome};

/// Train directly from a CSV file and persist the artifacts under `paths`.
pub fn train_from_csv(
    path: &Path,
    paths: &ArtifactPaths,
    params: TrainingParams,
) -> Result<TrainingOutcome, TrainerError> {
    let table = load_matches(path)?;
    MatchTrainer::new(params).train(&table, paths)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
