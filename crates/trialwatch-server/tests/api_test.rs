//! Router tests and a client round trip against a live listener.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use trialwatch_core::models::{ExperimentConfig, ResourcesConfig, SearcherConfig};
use trialwatch_core::{
    storage, ApiClient, Checkpoint, CheckpointState, DetailsSource, Experiment, RunState, Step,
    Trial, ValidationRecord,
};
use trialwatch_server::build_router;
use trialwatch_server::state::AppState;

fn trial(id: i64, metric: f64, state: CheckpointState, batches: i64) -> Trial {
    Trial {
        id,
        experiment_id: 1,
        best_available_checkpoint: Some(Checkpoint {
            validation_metric: Some(metric),
            state,
            trial_id: id,
            batch_number: batches,
            uuid: None,
            end_time: None,
        }),
        total_batches_processed: batches,
        state: RunState::Completed,
    }
}

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let experiment = Experiment {
        id: 1,
        state: RunState::Completed,
        config: ExperimentConfig {
            searcher: SearcherConfig {
                smaller_is_better: true,
                metric: "validation_error".into(),
            },
            resources: ResourcesConfig { max_slots: Some(4) },
            labels: vec!["squad".into()],
        },
        progress: Some(1.0),
        start_time: start,
        end_time: Some(start + chrono::Duration::minutes(30)),
        validation_history: vec![
            ValidationRecord::new(Some(0.3)),
            ValidationRecord::new(Some(0.1)),
            ValidationRecord::new(None),
        ],
        trials: vec![
            trial(10, 0.05, CheckpointState::Active, 400),
            trial(11, 0.1, CheckpointState::Completed, 300),
            trial(12, 0.3, CheckpointState::Completed, 200),
        ],
    };
    storage::save_experiment(tmp.path(), &experiment).unwrap();
    storage::save_trial_steps(
        tmp.path(),
        1,
        12,
        &[Step { id: 1, state: RunState::Errored, num_batches: 0 }],
    )
    .unwrap();
    tmp
}

async fn get_json(tmp: &TempDir, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = build_router(AppState::new(tmp.path().to_path_buf()));
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_list_experiments() {
    let tmp = fixture();
    let (status, body) = get_json(&tmp, "/api/v1/experiments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([1]));
}

#[tokio::test]
async fn test_summary_picks_completed_checkpoint() {
    let tmp = fixture();
    let (status, body) = get_json(&tmp, "/api/v1/experiments/1/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bestValidation"], 0.1);
    assert_eq!(body["bestCheckpoint"]["trialId"], 11);
    assert_eq!(body["bestCheckpoint"]["batch"], 300);
    assert_eq!(body["maxSlots"], 4);
    assert_eq!(body["durationSecs"], 1800.0);
}

#[tokio::test]
async fn test_unknown_ids_are_404() {
    let tmp = fixture();
    let (status, _) = get_json(&tmp, "/api/v1/experiments/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_json(&tmp, "/api/v1/trials/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_ids_are_404() {
    let tmp = fixture();
    for uri in [
        "/api/v1/experiments/x",
        "/api/v1/experiments/1.5/summary",
        "/api/v1/trials/abc",
        "/api/v1/trials/12abc/actions",
    ] {
        let app = build_router(AppState::new(tmp.path().to_path_buf()));
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).starts_with("Invalid "), "{uri}");
    }
}

#[tokio::test]
async fn test_trial_actions_hide_tensorboard_without_data() {
    let tmp = fixture();
    let (status, body) = get_json(&tmp, "/api/v1/trials/12/actions").await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["continue", "metrics", "metricsPopout", "logs"]);
    assert_eq!(body[1]["path"], "/det/trial-metrics/12");
}

#[tokio::test]
async fn test_client_round_trip() {
    let tmp = fixture();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_dir = tmp.path().to_path_buf();
    tokio::spawn(trialwatch_server::serve_listener(listener, base_dir));

    let client =
        ApiClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

    let details = client.get_trial_details(12).await.unwrap();
    assert_eq!(details.experiment_id(), 1);
    assert_eq!(details.steps.len(), 1);

    let experiment = client.get_experiment_details(1).await.unwrap();
    assert_eq!(experiment.trials.len(), 3);

    let err = client.get_trial_details(404).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Trial 404 not found");
}
