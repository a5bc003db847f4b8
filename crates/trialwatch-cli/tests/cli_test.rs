//! End-to-end tests of the `trw` binary against a snapshot directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const EXPERIMENT: &str = r#"
id: 1
state: COMPLETED
progress: 1.0
startTime: 2024-03-01T08:00:00Z
endTime: 2024-03-01T09:30:00Z
config:
  searcher:
    smallerIsBetter: false
    metric: accuracy
  resources:
    maxSlots: 16
  labels: [albert, squad]
validationHistory:
  - validationError: 0.71
  - validationError: 0.83
  - {}
trials:
  - id: 11
    experimentId: 1
    totalBatchesProcessed: 1200
    state: COMPLETED
    bestAvailableCheckpoint:
      validationMetric: 0.83
      state: COMPLETED
      trialId: 11
      batchNumber: 1200
  - id: 12
    experimentId: 1
    totalBatchesProcessed: 10
    state: ERRORED
    bestAvailableCheckpoint:
      validationMetric: 0.95
      state: ERROR
      trialId: 12
      batchNumber: 10
"#;

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("experiment.yaml"), EXPERIMENT).unwrap();
    tmp
}

fn trw() -> Command {
    let mut cmd = Command::cargo_bin("trw").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_summary_from_directory() {
    let tmp = fixture();
    trw()
        .args(["summary", "1", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0.83 (accuracy)"))
        .stdout(predicate::str::contains("Trial 11 Batch 1200"))
        .stdout(predicate::str::contains("1h 30m"))
        .stdout(predicate::str::contains("albert, squad"));
}

#[test]
fn test_summary_unknown_experiment_fails() {
    let tmp = fixture();
    trw()
        .args(["summary", "2", "--dir"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Experiment 2 not found"));
}

#[test]
fn test_actions_hide_tensorboard_for_errored_trial() {
    let tmp = fixture();
    trw()
        .args(["actions", "12", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("View Metrics"))
        .stdout(predicate::str::contains("/det/trials/12/logs (popout)"))
        .stdout(predicate::str::contains("Tensorboard").not());
}

#[test]
fn test_watch_prints_ready_trial() {
    let tmp = fixture();
    trw()
        .args(["watch", "11", "--interval-ms", "50", "--count", "1", "--dir"])
        .arg(tmp.path())
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::str::contains("Trial 11 [COMPLETED] batches=1200"))
        .stdout(predicate::str::contains("best checkpoint: Trial 11 Batch 1200"));
}

#[test]
fn test_watch_rejects_invalid_id() {
    trw()
        .args(["watch", "abc", "--dir", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Trial ID abc"));
}
