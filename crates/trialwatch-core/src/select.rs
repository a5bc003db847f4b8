//! Best-validation and best-checkpoint selection.
//!
//! Both selectors are pure: they borrow the snapshot, never cache a result,
//! and return `None` when nothing is eligible. Among equal values the first
//! one in input order wins, which is what a stable sort followed by taking
//! the head would give.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{CheckpointDetail, CheckpointState, Trial, ValidationRecord};

/// Whether smaller or larger metric values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricDirection {
    Minimize,
    Maximize,
}

impl MetricDirection {
    pub fn from_smaller_is_better(smaller_is_better: bool) -> Self {
        if smaller_is_better {
            MetricDirection::Minimize
        } else {
            MetricDirection::Maximize
        }
    }

    /// `Less` means `a` ranks ahead of `b`.
    fn rank(self, a: f64, b: f64) -> Ordering {
        match self {
            MetricDirection::Minimize => a.total_cmp(&b),
            MetricDirection::Maximize => b.total_cmp(&a),
        }
    }
}

fn pick_best<T>(candidates: impl Iterator<Item = (f64, T)>, direction: MetricDirection) -> Option<T> {
    let mut best: Option<(f64, T)> = None;
    for (value, item) in candidates {
        if value.is_nan() {
            continue;
        }
        // Only a strictly better value replaces the incumbent.
        let replace = match &best {
            Some((current, _)) => direction.rank(value, *current) == Ordering::Less,
            None => true,
        };
        if replace {
            best = Some((value, item));
        }
    }
    best.map(|(_, item)| item)
}

/// The best validation record of an experiment's history.
pub fn best_validation(
    history: &[ValidationRecord],
    direction: MetricDirection,
) -> Option<&ValidationRecord> {
    pick_best(
        history
            .iter()
            .filter_map(|r| r.validation_error.map(|e| (e, r))),
        direction,
    )
}

/// The best validation error value, if any record carries one.
pub fn best_validation_error(history: &[ValidationRecord], direction: MetricDirection) -> Option<f64> {
    best_validation(history, direction).and_then(|r| r.validation_error)
}

fn eligible_metric(trial: &Trial) -> Option<f64> {
    let ckpt = trial.best_available_checkpoint.as_ref()?;
    if ckpt.state != CheckpointState::Completed {
        return None;
    }
    ckpt.validation_metric
}

/// The best completed checkpoint across trials, annotated with its trial's
/// id, experiment id and processed batch count.
pub fn best_checkpoint(trials: &[Trial], direction: MetricDirection) -> Option<CheckpointDetail> {
    let winner = pick_best(
        trials
            .iter()
            .filter_map(|t| eligible_metric(t).map(|m| (m, t))),
        direction,
    )?;
    winner
        .best_available_checkpoint
        .as_ref()
        .map(|ckpt| CheckpointDetail::from_trial(winner, ckpt))
}
