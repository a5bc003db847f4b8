//! Experiment summary: the values shown in an experiment's info panel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CheckpointDetail, Experiment, RunState};
use crate::select::{best_checkpoint, best_validation_error, MetricDirection};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub experiment_id: i64,
    pub state: RunState,
    pub progress_percent: Option<f64>,
    /// Name of the searcher metric the validation values refer to.
    pub metric: String,
    pub direction: MetricDirection,
    pub best_validation: Option<f64>,
    pub best_checkpoint: Option<CheckpointDetail>,
    pub max_slots: Option<i64>,
    pub start_time: DateTime<Utc>,
    /// Only set once the experiment has ended.
    pub duration_secs: Option<f64>,
    pub labels: Vec<String>,
}

impl ExperimentSummary {
    pub fn from_experiment(experiment: &Experiment) -> Self {
        let config = &experiment.config;
        let direction = MetricDirection::from_smaller_is_better(config.searcher.smaller_is_better);

        Self {
            experiment_id: experiment.id,
            state: experiment.state,
            progress_percent: experiment.progress.map(|p| p * 100.0),
            metric: config.searcher.metric.clone(),
            direction,
            best_validation: best_validation_error(&experiment.validation_history, direction),
            best_checkpoint: best_checkpoint(&experiment.trials, direction),
            max_slots: config.resources.max_slots,
            start_time: experiment.start_time,
            duration_secs: experiment
                .end_time
                .map(|end| (end - experiment.start_time).num_milliseconds() as f64 / 1000.0),
            labels: config.labels.clone(),
        }
    }

    /// e.g. `0.0312 (validation_loss)`
    pub fn best_validation_label(&self) -> Option<String> {
        self.best_validation
            .map(|v| format!("{} ({})", human_readable_float(v), self.metric))
    }

    /// e.g. `Trial 12 Batch 3200`
    pub fn best_checkpoint_label(&self) -> Option<String> {
        self.best_checkpoint
            .as_ref()
            .map(|c| format!("Trial {} Batch {}", c.trial_id, c.batch))
    }
}

/// Compact rendering of a metric value: fixed-point for ordinary magnitudes,
/// scientific notation for very small or very large ones.
pub fn human_readable_float(v: f64) -> String {
    if v == 0.0 || !v.is_finite() {
        return v.to_string();
    }
    let abs = v.abs();
    if !(1e-3..1e6).contains(&abs) {
        return format!("{v:.3e}");
    }
    let fixed = format!("{v:.4}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Checkpoint, CheckpointState, ExperimentConfig, ResourcesConfig, SearcherConfig, Trial,
        ValidationRecord,
    };
    use chrono::TimeZone;

    fn experiment(smaller_is_better: bool) -> Experiment {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Experiment {
            id: 5,
            state: RunState::Completed,
            config: ExperimentConfig {
                searcher: SearcherConfig {
                    smaller_is_better,
                    metric: "validation_loss".into(),
                },
                resources: ResourcesConfig { max_slots: Some(8) },
                labels: vec!["albert".into()],
            },
            progress: Some(0.5),
            start_time: start,
            end_time: Some(start + chrono::Duration::seconds(90)),
            validation_history: vec![
                ValidationRecord::new(Some(0.4)),
                ValidationRecord::new(None),
                ValidationRecord::new(Some(0.25)),
            ],
            trials: vec![
                Trial {
                    id: 11,
                    experiment_id: 5,
                    best_available_checkpoint: Some(Checkpoint {
                        validation_metric: Some(0.25),
                        state: CheckpointState::Completed,
                        trial_id: 11,
                        batch_number: 300,
                        uuid: Some("abc".into()),
                        end_time: None,
                    }),
                    total_batches_processed: 320,
                    state: RunState::Completed,
                },
                Trial {
                    id: 12,
                    experiment_id: 5,
                    best_available_checkpoint: Some(Checkpoint {
                        validation_metric: Some(0.4),
                        state: CheckpointState::Completed,
                        trial_id: 12,
                        batch_number: 100,
                        uuid: None,
                        end_time: None,
                    }),
                    total_batches_processed: 100,
                    state: RunState::Completed,
                },
            ],
        }
    }

    #[test]
    fn test_summary_minimize() {
        let summary = ExperimentSummary::from_experiment(&experiment(true));
        assert_eq!(summary.best_validation, Some(0.25));
        assert_eq!(summary.best_validation_label().as_deref(), Some("0.25 (validation_loss)"));
        assert_eq!(summary.best_checkpoint_label().as_deref(), Some("Trial 11 Batch 320"));
        assert_eq!(summary.progress_percent, Some(50.0));
        assert_eq!(summary.max_slots, Some(8));
        assert_eq!(summary.duration_secs, Some(90.0));
        assert_eq!(summary.labels, vec!["albert".to_string()]);
    }

    #[test]
    fn test_summary_maximize() {
        let summary = ExperimentSummary::from_experiment(&experiment(false));
        assert_eq!(summary.best_validation, Some(0.4));
        assert_eq!(summary.best_checkpoint.unwrap().trial_id, 12);
    }

    #[test]
    fn test_running_experiment_has_no_duration() {
        let mut exp = experiment(true);
        exp.end_time = None;
        exp.validation_history.clear();
        exp.trials.clear();
        let summary = ExperimentSummary::from_experiment(&exp);
        assert!(summary.duration_secs.is_none());
        assert!(summary.best_validation_label().is_none());
        assert!(summary.best_checkpoint_label().is_none());
    }

    #[test]
    fn test_human_readable_float() {
        assert_eq!(human_readable_float(0.25), "0.25");
        assert_eq!(human_readable_float(1.0), "1");
        assert_eq!(human_readable_float(0.123456), "0.1235");
        assert_eq!(human_readable_float(0.0), "0");
        assert_eq!(human_readable_float(0.00001), "1.000e-5");
    }
}
