//! Inference over a loaded pipeline
//!
//! A [`Predictor`] is built once, before any request is served, and is
//! immutable afterwards. Share it as a [`SharedPredictor`]; no locking is
//! needed because scoring never mutates it.

use crate::artifacts::{ensure_schema, load_artifacts, ArtifactPaths};
use crate::errors::{PredictorError, Result};
use crate::pipeline::MatchScorer;
use crate::types::{
    normalize_toss_decision, FeatureColumns, MatchContext, PredictionResult, TOSS_DECISION_COLUMN,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only handle shared by concurrent request handlers
pub type SharedPredictor = Arc<Predictor>;

/// Scores match contexts against a loaded model
pub struct Predictor {
    scorer: Box<dyn MatchScorer>,
    columns: FeatureColumns,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Load artifacts from disk and validate the column schema
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let (pipeline, columns) = load_artifacts(paths)?;
        let predictor = Self::new(Box::new(pipeline), columns)?;
        info!("Predictor ready over columns {}", predictor.columns);
        Ok(predictor)
    }

    /// Wrap a scorer; the column list must match what the scorer expects
    pub fn new(scorer: Box<dyn MatchScorer>, columns: FeatureColumns) -> Result<Self> {
        ensure_schema(scorer.as_ref(), &columns)?;
        Ok(Self { scorer, columns })
    }

    /// Convert into the shared handle passed to request handlers
    pub fn into_shared(self) -> SharedPredictor {
        Arc::new(self)
    }

    pub fn feature_columns(&self) -> &FeatureColumns {
        &self.columns
    }

    /// Categories the model was fitted on for one column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.scorer.categories(column)
    }

    /// Win probabilities for a match context.
    ///
    /// `team1 == team2` is not rejected here; unseen values fall back to the
    /// all-zero encoding for their column.
    pub fn predict(&self, context: &MatchContext) -> Result<PredictionResult> {
        let mut row = Vec::with_capacity(self.columns.len());
        for name in self.columns.iter() {
            let value = context
                .field(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    PredictorError::PredictionInput(format!("missing field `{}`", name))
                })?;

            row.push(if name == TOSS_DECISION_COLUMN {
                normalize_toss_decision(value)
            } else {
                value.to_string()
            });
        }

        let p = self.scorer.score_row(&row)?;
        debug!("Scored {:?} -> {:.4}", row, p);
        Ok(PredictionResult::from_team1_probability(p))
    }

    /// Win probabilities from name/value pairs in any order
    pub fn predict_fields<I, K, V>(&self, fields: I) -> Result<PredictionResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.predict(&MatchContext::from_fields(fields)?)
    }
}
