//! Endpoint tests against an in-memory router

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use ipl_predictor_core::{
    prepare, FeatureColumns, FittedPipeline, Predictor, RawTable, TrainingParams, REQUIRED_COLUMNS,
};
use ipl_predictor_service::api::{OptionsResponse, PredictResponse, SAME_TEAM_MESSAGE};
use ipl_predictor_service::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn history() -> RawTable {
    let rows = [
        ["2020", "Eden Gardens", "A", "B", "A", "bat", "A"],
        ["2020", "Eden Gardens", "A", "C", "C", "field", "A"],
        ["2020", "Chepauk", "B", "C", "B", "bat", "C"],
        ["2021", "Chepauk", "C", "A", "A", "field", "A"],
        ["2021", "Wankhede Stadium", "B", "A", "B", "bat", "B"],
        ["2021", "Wankhede Stadium", "C", "B", "C", "field", "C"],
        ["2019", "Eden Gardens", "B", "A", "A", "bat", "A"],
        ["2019", "Chepauk", "A", "B", "B", "field", "A"],
    ];
    let mut table = RawTable::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in rows {
        table.push_row(row.iter().map(|c| Some(c.to_string())).collect());
    }
    table
}

fn app() -> Router {
    let prepared = prepare(&history()).expect("prepare");
    let pipeline = FittedPipeline::fit(&prepared.features, &prepared.labels, &TrainingParams::default())
        .expect("fit");
    let predictor = Predictor::new(Box::new(pipeline), FeatureColumns::standard())
        .expect("schema")
        .into_shared();
    let teams = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    build_router(Arc::new(AppState::new(predictor, teams)))
}

async fn post_json(app: Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

async fn post_raw(app: Router, body: &'static str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

async fn get_json(app: Router, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder().uri(uri).body(Body::empty())?;
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (status, body) = get_json(app(), "/api/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["feature_columns"].as_array().map(Vec::len), Some(6));
    Ok(())
}

#[tokio::test]
async fn test_options_lists_sorted_vocabularies() -> Result<()> {
    let (status, body) = get_json(app(), "/api/options").await?;
    assert_eq!(status, StatusCode::OK);
    let options: OptionsResponse = serde_json::from_value(body)?;
    assert_eq!(options.teams, vec!["A", "B", "C"]);
    assert_eq!(options.venues, vec!["Chepauk", "Eden Gardens", "Wankhede Stadium"]);
    assert_eq!(options.seasons, vec!["2019", "2020", "2021"]);
    Ok(())
}

#[tokio::test]
async fn test_predict_returns_complementary_pair() -> Result<()> {
    let (status, body) = post_json(
        app(),
        "/api/predict",
        json!({
            "season": 2020,
            "venue": "Eden Gardens",
            "team1": "A",
            "team2": "B",
            "toss_winner": "A",
            "toss_decision": "bat"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let result: PredictResponse = serde_json::from_value(body)?;
    assert_eq!(result.team1, "A");
    assert_eq!(result.team2, "B");
    assert!((0.0..=1.0).contains(&result.team1_win_probability));
    assert_eq!(result.team1_win_probability + result.team2_win_probability, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_season_as_string_or_number_agree() -> Result<()> {
    let body = |season: Value| {
        json!({
            "season": season,
            "venue": "Chepauk",
            "team1": "B",
            "team2": "C",
            "toss_winner": "C",
            "toss_decision": "field"
        })
    };
    let (_, numeric) = post_json(app(), "/api/predict", body(json!(2021))).await?;
    let (_, text) = post_json(app(), "/api/predict", body(json!("2021"))).await?;
    assert_eq!(numeric, text);
    Ok(())
}

#[tokio::test]
async fn test_unseen_values_still_predict() -> Result<()> {
    let (status, body) = post_json(
        app(),
        "/api/predict",
        json!({
            "season": "2030",
            "venue": "Narendra Modi Stadium",
            "team1": "Gujarat Titans",
            "team2": "A",
            "toss_winner": "Gujarat Titans",
            "toss_decision": "Field"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let result: PredictResponse = serde_json::from_value(body)?;
    assert_eq!(result.team1_win_probability + result.team2_win_probability, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_same_team_is_rejected() -> Result<()> {
    let (status, body) = post_json(
        app(),
        "/api/predict",
        json!({
            "season": "2020",
            "venue": "Eden Gardens",
            "team1": "A",
            "team2": "A",
            "toss_winner": "A",
            "toss_decision": "bat"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], SAME_TEAM_MESSAGE);
    Ok(())
}

#[tokio::test]
async fn test_missing_field_is_a_bad_request() -> Result<()> {
    let (status, body) = post_json(
        app(),
        "/api/predict",
        json!({
            "season": "2020",
            "venue": "Eden Gardens",
            "team1": "A",
            "team2": "B",
            "toss_winner": "A"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .is_some_and(|msg| msg.contains("toss_decision")));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() -> Result<()> {
    let (status, body) = post_raw(app(), "{\"season\": 2020, \"venue\": ").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_wrongly_typed_body_gets_json_error() -> Result<()> {
    let (status, body) = post_raw(app(), "{\"season\": 2020, \"venue\": [1, 2]}").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    Ok(())
}
