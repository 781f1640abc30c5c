//! IPL match winner prediction core
//!
//! Fits and serves a categorical classification pipeline that estimates the
//! probability that `team1` wins a match, given season, venue, both teams,
//! toss winner and toss decision.
//!
//! Modules:
//! - `prepare`: Raw match records to predictor frame and `team1_win` labels
//! - `encoder`: Unseen-category tolerant one-hot encoding
//! - `classifier`: Class-weighted, L2-regularized logistic regression
//! - `metrics`: ROC AUC and accuracy
//! - `pipeline`: Encoder + classifier composite and the `MatchScorer` trait
//! - `artifacts`: Atomic persistence and verified loading of fitted pipelines
//! - `predictor`: Load-once, shared inference handle
//! - `config`: TOML configuration
//! - `report`: Training report and canonical JSON

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod prepare;
pub mod report;
pub mod types;

pub use artifacts::{load_artifacts, model_hash, save_artifacts, ArtifactPaths, SavedArtifacts};
pub use classifier::{ClassWeight, LogisticRegression, TrainingParams};
pub use config::{ArtifactsConfig, PredictorConfig, ServiceConfig};
pub use encoder::OneHotEncoder;
pub use errors::{PredictorError, Result};
pub use metrics::{accuracy, roc_auc};
pub use pipeline::{FittedPipeline, MatchScorer};
pub use predictor::{Predictor, SharedPredictor};
pub use prepare::{prepare, PreparedData, RawTable};
pub use report::TrainingReport;
pub use types::{
    CategoricalFrame, FeatureColumns, MatchContext, PredictionResult,
    FEATURE_COLUMNS, REQUIRED_COLUMNS,
};

/// Crate version string for reports and health endpoints
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
