//! Fitted encoder + classifier composite
//!
//! [`FittedPipeline`] is the single serializable object persisted by training
//! and loaded by inference. Callers interact with it through [`MatchScorer`],
//! which only exposes the column schema and row scoring.

use crate::classifier::{LogisticRegression, TrainingParams};
use crate::encoder::OneHotEncoder;
use crate::errors::{PredictorError, Result};
use crate::types::CategoricalFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scores categorical match rows as team1 win probabilities
pub trait MatchScorer: Send + Sync {
    /// Columns a row must provide, in order
    fn feature_columns(&self) -> &[String];

    /// Probability that team1 wins, for a row laid out as [`Self::feature_columns`]
    fn score_row(&self, row: &[String]) -> Result<f64>;

    /// Known category values for a column, if the scorer tracks them
    fn categories(&self, _column: &str) -> Option<&[String]> {
        None
    }
}

/// One-hot encoder and logistic regression fitted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    encoder: OneHotEncoder,
    classifier: LogisticRegression,
}

impl FittedPipeline {
    /// Fit the encoder on `features`, then the classifier on the encoded rows
    pub fn fit(features: &CategoricalFrame, labels: &[bool], params: &TrainingParams) -> Result<Self> {
        if features.is_empty() {
            return Err(PredictorError::EmptyDataset);
        }

        let encoder = OneHotEncoder::fit(features);
        info!(
            "Encoder fitted: {} columns -> {} indicator features",
            encoder.columns().len(),
            encoder.width()
        );

        let encoded = encoder.transform(features)?;
        let classifier = LogisticRegression::fit(&encoded, labels, params)?;
        info!(
            "Classifier fitted in {} iterations (converged={})",
            classifier.iterations(),
            classifier.converged()
        );

        Ok(Self {
            encoder,
            classifier,
        })
    }

    /// Assemble from already fitted parts
    pub fn from_parts(encoder: OneHotEncoder, classifier: LogisticRegression) -> Result<Self> {
        let pipeline = Self {
            encoder,
            classifier,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Team1 win probabilities for every row of a frame
    pub fn predict_probabilities(&self, features: &CategoricalFrame) -> Result<Vec<f64>> {
        self.encoder
            .transform(features)?
            .iter()
            .map(|row| self.classifier.predict_probability(row))
            .collect()
    }

    /// Check that encoder and classifier agree and weights are usable
    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;
        if self.classifier.dim() != self.encoder.width() {
            return Err(PredictorError::Artifact(format!(
                "classifier expects {} features but encoder produces {}",
                self.classifier.dim(),
                self.encoder.width()
            )));
        }
        if !self.classifier.is_finite() {
            return Err(PredictorError::Artifact(
                "classifier weights contain non-finite values".into(),
            ));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let pipeline: Self = bincode::deserialize(bytes)?;
        pipeline.validate()?;
        Ok(pipeline)
    }
}

impl MatchScorer for FittedPipeline {
    fn feature_columns(&self) -> &[String] {
        self.encoder.columns()
    }

    fn score_row(&self, row: &[String]) -> Result<f64> {
        let active = self.encoder.active_indices(row)?;
        self.classifier.predict_probability_sparse(&active)
    }

    fn categories(&self, column: &str) -> Option<&[String]> {
        self.encoder.categories(column)
    }
}
