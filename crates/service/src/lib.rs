//! HTTP prediction service for the IPL match winner predictor
//!
//! The predictor is loaded once before the listener is bound and shared
//! read-only with every request through [`AppState`].

pub mod api;

use axum::{
    routing::{get, post},
    Router,
};
use ipl_predictor_core::{ArtifactPaths, Predictor, SharedPredictor};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// State shared by all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: SharedPredictor,
    /// Teams offered for selection
    pub teams: Vec<String>,
}

impl AppState {
    pub fn new(predictor: SharedPredictor, teams: Vec<String>) -> Self {
        Self { predictor, teams }
    }

    /// Load the predictor from its artifacts
    pub fn load(paths: &ArtifactPaths, teams: Vec<String>) -> ipl_predictor_core::Result<Self> {
        let predictor = Predictor::load(paths)?.into_shared();
        info!(
            "Serving predictions over {} columns, {} selectable teams",
            predictor.feature_columns().len(),
            teams.len()
        );
        Ok(Self::new(predictor, teams))
    }
}

pub type SharedState = Arc<AppState>;

/// Routes of the prediction service
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/api/health", get(api::health))
        .route("/api/options", get(api::options))
        .route("/api/predict", post(api::predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
