//! REST API handlers for trialwatch-server.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use trialwatch_core::actions::{available_actions, TrialAction};
use trialwatch_core::{storage, ExperimentSummary, TrackerError};

use crate::state::AppState;

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/experiments", get(list_experiments))
        .route("/experiments/{id}", get(get_experiment))
        .route("/experiments/{id}/summary", get(get_experiment_summary))
        .route("/trials/{id}", get(get_trial))
        .route("/trials/{id}/actions", get(get_trial_actions))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn error_response(e: TrackerError) -> Response {
    // A path segment that is not an id names no resource either.
    if e.is_not_found() || matches!(e, TrackerError::InvalidId { .. }) {
        return (StatusCode::NOT_FOUND, e.to_string()).into_response();
    }
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

fn parse_id(kind: &'static str, raw: &str) -> Result<i64, Response> {
    raw.parse().map_err(|_| {
        error_response(TrackerError::InvalidId {
            kind,
            value: raw.to_string(),
        })
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionInfo {
    action: TrialAction,
    label: &'static str,
    path: Option<String>,
    popout: bool,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn list_experiments(State(state): State<AppState>) -> Result<Response, Response> {
    let ids = storage::list_experiments(&state.base_dir).map_err(error_response)?;
    Ok(Json(ids).into_response())
}

async fn get_experiment(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response, Response> {
    let id = parse_id("Experiment", &raw)?;
    let experiment = storage::load_experiment(&state.base_dir, id).map_err(error_response)?;
    Ok(Json(experiment).into_response())
}

async fn get_experiment_summary(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, Response> {
    let id = parse_id("Experiment", &raw)?;
    let experiment = storage::load_experiment(&state.base_dir, id).map_err(error_response)?;
    Ok(Json(ExperimentSummary::from_experiment(&experiment)).into_response())
}

async fn get_trial(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response, Response> {
    let id = parse_id("Trial", &raw)?;
    let details = storage::load_trial_details(&state.base_dir, id).map_err(error_response)?;
    Ok(Json(details).into_response())
}

async fn get_trial_actions(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response, Response> {
    let id = parse_id("Trial", &raw)?;
    let details = storage::load_trial_details(&state.base_dir, id).map_err(error_response)?;
    let actions: Vec<ActionInfo> = available_actions(&details)
        .into_iter()
        .map(|action| ActionInfo {
            action,
            label: action.label(),
            path: action.path(id),
            popout: action.is_popout(),
        })
        .collect();
    Ok(Json(actions).into_response())
}
