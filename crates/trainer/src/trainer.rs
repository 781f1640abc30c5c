//! Training orchestration
//!
//! Prepares raw match records, fits the encoder and classifier, scores the
//! training rows for the in-sample AUC and persists the result. Nothing is
//! written unless every earlier step succeeded.

use chrono::{SecondsFormat, Utc};
use ipl_predictor_core::{
    accuracy, prepare, roc_auc, save_artifacts, ArtifactPaths, FeatureColumns, FittedPipeline,
    PredictorError, RawTable, SavedArtifacts, TrainingParams, TrainingReport,
};
use tracing::{debug, info};

use crate::errors::TrainerError;

/// A fitted pipeline with its diagnostics, not yet persisted
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub pipeline: FittedPipeline,
    pub columns: FeatureColumns,
    pub report: TrainingReport,
}

/// Result of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: FittedPipeline,
    pub saved: SavedArtifacts,
}

impl TrainingOutcome {
    pub fn report(&self) -> &TrainingReport {
        &self.saved.report
    }

    pub fn in_sample_auc(&self) -> f64 {
        self.saved.report.in_sample_auc
    }
}

/// Match outcome trainer
#[derive(Debug, Clone, Default)]
pub struct MatchTrainer {
    params: TrainingParams,
}

impl MatchTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Prepare and fit without touching the filesystem
    pub fn fit(&self, table: &RawTable) -> Result<FittedModel, TrainerError> {
        self.params.validate()?;

        let prepared = prepare(table)?;
        if prepared.is_empty() {
            return Err(PredictorError::EmptyDataset.into());
        }
        let found = prepared.distinct_classes();
        if found < 2 {
            return Err(PredictorError::LabelCardinality { found }.into());
        }
        let (team1_wins, team1_losses) = prepared.class_counts();
        debug!(
            "Class balance: {} team1 wins, {} team1 losses",
            team1_wins, team1_losses
        );

        let pipeline = FittedPipeline::fit(&prepared.features, &prepared.labels, &self.params)?;

        let scores = pipeline.predict_probabilities(&prepared.features)?;
        let in_sample_auc = roc_auc(&scores, &prepared.labels).ok_or_else(|| {
            PredictorError::Numerical("in-sample ROC AUC is undefined".into())
        })?;
        let in_sample_accuracy = accuracy(&scores, &prepared.labels).unwrap_or(0.0);
        info!(
            "In-sample ROC AUC {:.4}, accuracy {:.4}",
            in_sample_auc, in_sample_accuracy
        );

        let columns = FeatureColumns::new(prepared.features.columns().to_vec());
        let report = TrainingReport {
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            feature_columns: columns.as_slice().to_vec(),
            rows_total: prepared.total_rows,
            rows_used: prepared.len(),
            rows_dropped: prepared.dropped_rows,
            team1_wins,
            team1_losses,
            encoded_width: pipeline.encoder().width(),
            solver_iterations: pipeline.classifier().iterations(),
            converged: pipeline.classifier().converged(),
            in_sample_auc,
            in_sample_accuracy,
            model_hash: String::new(),
        };

        Ok(FittedModel {
            pipeline,
            columns,
            report,
        })
    }

    /// Fit, then persist the pipeline and its column list under `paths`
    pub fn train(
        &self,
        table: &RawTable,
        paths: &ArtifactPaths,
    ) -> Result<TrainingOutcome, TrainerError> {
        let fitted = self.fit(table)?;
        let saved = save_artifacts(paths, &fitted.pipeline, &fitted.columns, &fitted.report)?;
        Ok(TrainingOutcome {
            pipeline: fitted.pipeline,
            saved,
        })
    }
}
