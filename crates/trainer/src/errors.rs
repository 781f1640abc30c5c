use ipl_predictor_core::PredictorError;
use thiserror::Error;

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl TrainerError {
    /// The core error behind this failure, if any
    pub fn as_predictor_error(&self) -> Option<&PredictorError> {
        match self {
            TrainerError::Predictor(err) => Some(err),
            _ => None,
        }
    }
}
