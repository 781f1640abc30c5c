//! Request handlers and wire types

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use ipl_predictor_core::{PredictionResult, PredictorError, VERSION};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::SharedState;

/// Message returned when both sides of a request name the same team
pub const SAME_TEAM_MESSAGE: &str = "Team A and Team B must be different.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        if err.is_request_error() {
            Self::bad_request(err.to_string())
        } else {
            warn!("Prediction failed: {}", err);
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, "prediction failed")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

/// Prediction request body.
///
/// Every field defaults to empty so a missing field is reported by the
/// predictor rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub season: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub team1: String,
    #[serde(default)]
    pub team2: String,
    #[serde(default)]
    pub toss_winner: String,
    #[serde(default)]
    pub toss_decision: String,
}

impl PredictRequest {
    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("season", self.season.as_str()),
            ("venue", self.venue.as_str()),
            ("team1", self.team1.as_str()),
            ("team2", self.team2.as_str()),
            ("toss_winner", self.toss_winner.as_str()),
            ("toss_decision", self.toss_decision.as_str()),
        ]
    }
}

/// Seasons arrive as `"2020"` or `2020`
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Null(()) => String::new(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub team1: String,
    pub team2: String,
    pub team1_win_probability: f64,
    pub team2_win_probability: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub teams: Vec<String>,
    pub venues: Vec<String>,
    pub seasons: Vec<String>,
    pub toss_decisions: Vec<String>,
}

pub async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>IPL Match Winner Predictor</title></head>
<body>
    <h1>IPL Match Winner Predictor</h1>
    <ul>
        <li><code>GET /api/health</code> - Health check</li>
        <li><code>GET /api/options</code> - Selectable teams, venues and seasons</li>
        <li><code>POST /api/predict</code> - Win probabilities for a match</li>
    </ul>
    <pre><code>curl -X POST http://localhost:8501/api/predict \
  -H 'content-type: application/json' \
  -d '{"season":2020,"venue":"Eden Gardens","team1":"Kolkata Knight Riders","team2":"Mumbai Indians","toss_winner":"Mumbai Indians","toss_decision":"field"}'</code></pre>
</body>
</html>
"#,
    )
}

pub async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": VERSION,
        "service": "ipl-predictor-service",
        "feature_columns": state.predictor.feature_columns().as_slice(),
    }))
}

pub async fn options(State(state): State<SharedState>) -> Json<OptionsResponse> {
    let vocabulary = |column: &str| {
        state
            .predictor
            .categories(column)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    };

    Json(OptionsResponse {
        teams: state.teams.clone(),
        venues: vocabulary("venue"),
        seasons: vocabulary("season"),
        toss_decisions: vec!["bat".to_string(), "field".to_string()],
    })
}

pub async fn predict(
    State(state): State<SharedState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected prediction body: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;

    let team1 = request.team1.trim();
    let team2 = request.team2.trim();
    if !team1.is_empty() && team1 == team2 {
        return Err(ApiError::bad_request(SAME_TEAM_MESSAGE));
    }

    let PredictionResult {
        team1_win_probability,
        team2_win_probability,
    } = state.predictor.predict_fields(request.fields())?;
    debug!(
        "{} vs {}: {:.4} / {:.4}",
        team1, team2, team1_win_probability, team2_win_probability
    );

    Ok(Json(PredictResponse {
        team1: team1.to_string(),
        team2: team2.to_string(),
        team1_win_probability,
        team2_win_probability,
    }))
}
