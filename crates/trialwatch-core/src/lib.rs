//! trialwatch-core: selection, polling and client logic for trialwatch.
//!
//! Best validation and best checkpoint are always derived fresh from the
//! current snapshot. Snapshots are refreshed by a cancellable poll loop that
//! never lets a failed fetch stop it.

pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod poll;
pub mod select;
pub mod storage;
pub mod summary;
pub mod watcher;

pub use actions::{available_actions, TrialAction};
pub use client::{ApiClient, DetailsSource};
pub use config::WatchConfig;
pub use error::{Result, TrackerError};
pub use models::{
    Checkpoint, CheckpointDetail, CheckpointState, Experiment, RunState, Step, Trial, TrialDetails,
    ValidationRecord,
};
pub use poll::{start_polling, PollHandle, ResourceState};
pub use select::{best_checkpoint, best_validation, best_validation_error, MetricDirection};
pub use summary::ExperimentSummary;
pub use watcher::{TrialMetricsView, TrialMetricsWatcher};
