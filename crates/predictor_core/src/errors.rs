//! Error types for the predictor core

use thiserror::Error;

/// Errors raised while preparing data, fitting, persisting or serving the pipeline
#[derive(Error, Debug)]
pub enum PredictorError {
    /// Raw match records lack one or more required columns
    #[error("Missing required columns: {}", .missing.join(", "))]
    Data { missing: Vec<String> },

    /// No record survived the completeness filter
    #[error("No complete match records remain after filtering")]
    EmptyDataset,

    /// Labels do not contain both outcomes
    #[error("Training labels must contain two classes, found {found}")]
    LabelCardinality { found: usize },

    /// Persisted column list disagrees with what the model was fitted on
    #[error(
        "Feature column mismatch: model expects [{}], column list has [{}]",
        .expected.join(","),
        .found.join(",")
    )]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A single prediction request is malformed
    #[error("Invalid prediction input: {0}")]
    PredictionInput(String),

    /// Encoded rows do not have the width the classifier expects
    #[error("Encoded width mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Solver failure during fitting
    #[error("Numerical failure: {0}")]
    Numerical(String),

    /// Artifact files are malformed or fail verification
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary model serialization error
    #[error("Model serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl PredictorError {
    /// Whether the error is attributable to the caller of a single prediction
    pub fn is_request_error(&self) -> bool {
        matches!(self, PredictorError::PredictionInput(_))
    }
}

/// Result type for predictor operations
pub type Result<T> = std::result::Result<T, PredictorError>;
