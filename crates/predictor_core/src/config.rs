//! Configuration for training, artifacts and the prediction service

use crate::classifier::TrainingParams;
use crate::errors::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Teams offered by the service's options endpoint unless configured otherwise.
pub const DEFAULT_TEAMS: [&str; 10] = [
    "Chennai Super Kings",
    "Mumbai Indians",
    "Royal Challengers Bangalore",
    "Kolkata Knight Riders",
    "Sunrisers Hyderabad",
    "Rajasthan Royals",
    "Delhi Capitals",
    "Punjab Kings",
    "Gujarat Titans",
    "Lucknow Super Giants",
];

/// Top-level configuration, loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub artifacts: ArtifactsConfig,
    pub training: TrainingParams,
    pub service: ServiceConfig,
}

/// Artifact directory and file names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub features_file: String,
    pub hash_file: String,
    pub report_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            model_file: "model.bin".to_string(),
            features_file: "feature_columns.txt".to_string(),
            hash_file: "model.hash".to_string(),
            report_file: "training_report.json".to_string(),
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Teams offered for selection
    pub teams: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            teams: DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl PredictorConfig {
    /// Load from a TOML file; absent sections take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::Config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PredictorError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PredictorError::Config(format!("failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        let names = [
            &self.artifacts.model_file,
            &self.artifacts.features_file,
            &self.artifacts.hash_file,
            &self.artifacts.report_file,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(PredictorError::Config(
                "artifact file names must not be empty".into(),
            ));
        }
        for (i, a) in names.iter().enumerate() {
            if names[i + 1..].contains(a) {
                return Err(PredictorError::Config(format!(
                    "artifact file name {} is used twice",
                    a
                )));
            }
        }
        Ok(())
    }
}
