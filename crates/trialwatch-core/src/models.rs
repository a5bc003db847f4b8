//! Data models for trialwatch.
//!
//! These mirror the dashboard API's JSON shapes (camelCase field names).
//! Snapshots are read-only: nothing in this crate mutates them, selections
//! are derived fresh each time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an experiment, trial or step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Active,
    Paused,
    StoppingCanceled,
    StoppingCompleted,
    StoppingError,
    Canceled,
    Completed,
    Errored,
    Deleted,
}

impl RunState {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Canceled | RunState::Completed | RunState::Errored | RunState::Deleted
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Active => "ACTIVE",
            RunState::Paused => "PAUSED",
            RunState::StoppingCanceled => "STOPPING_CANCELED",
            RunState::StoppingCompleted => "STOPPING_COMPLETED",
            RunState::StoppingError => "STOPPING_ERROR",
            RunState::Canceled => "CANCELED",
            RunState::Completed => "COMPLETED",
            RunState::Errored => "ERRORED",
            RunState::Deleted => "DELETED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointState {
    Active,
    Completed,
    Deleted,
    Error,
}

/// One historical validation point of an experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    #[serde(default)]
    pub validation_error: Option<f64>,
    #[serde(default)]
    pub trial_id: Option<i64>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl ValidationRecord {
    pub fn new(validation_error: Option<f64>) -> Self {
        Self {
            validation_error,
            ..Default::default()
        }
    }
}

/// A persisted model snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default)]
    pub validation_metric: Option<f64>,
    pub state: CheckpointState,
    pub trial_id: i64,
    pub batch_number: i64,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// A checkpoint annotated with the context of the trial it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointDetail {
    pub validation_metric: Option<f64>,
    pub state: CheckpointState,
    pub batch_number: i64,
    pub uuid: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
    /// Batches processed by the owning trial.
    pub batch: i64,
    pub experiment_id: i64,
    pub trial_id: i64,
}

impl CheckpointDetail {
    /// Combine a checkpoint with the context of the trial that owns it.
    pub fn from_trial(trial: &Trial, checkpoint: &Checkpoint) -> Self {
        Self {
            validation_metric: checkpoint.validation_metric,
            state: checkpoint.state,
            batch_number: checkpoint.batch_number,
            uuid: checkpoint.uuid.clone(),
            end_time: checkpoint.end_time,
            batch: trial.total_batches_processed,
            experiment_id: trial.experiment_id,
            trial_id: trial.id,
        }
    }
}

/// One training run within an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub id: i64,
    pub experiment_id: i64,
    #[serde(default)]
    pub best_available_checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub total_batches_processed: i64,
    pub state: RunState,
}

/// A training workload of a trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: i64,
    pub state: RunState,
    #[serde(default)]
    pub num_batches: i64,
}

/// A trial together with its steps, as returned by the trial details endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialDetails {
    #[serde(flatten)]
    pub trial: Trial,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TrialDetails {
    pub fn id(&self) -> i64 {
        self.trial.id
    }

    pub fn experiment_id(&self) -> i64 {
        self.trial.experiment_id
    }

    pub fn state(&self) -> RunState {
        self.trial.state
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearcherConfig {
    #[serde(default = "default_smaller_is_better")]
    pub smaller_is_better: bool,
    pub metric: String,
}

fn default_smaller_is_better() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesConfig {
    #[serde(default)]
    pub max_slots: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A hyperparameter search or training run made of trials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: i64,
    pub state: RunState,
    pub config: ExperimentConfig,
    /// Fraction in `[0, 1]` when the searcher reports it.
    #[serde(default)]
    pub progress: Option<f64>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validation_history: Vec<ValidationRecord>,
    #[serde(default)]
    pub trials: Vec<Trial>,
}

impl Experiment {
    pub fn trial(&self, trial_id: i64) -> Option<&Trial> {
        self.trials.iter().find(|t| t.id == trial_id)
    }
}
