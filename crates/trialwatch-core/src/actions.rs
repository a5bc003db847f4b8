//! Actions a trial offers, and the routes they lead to.

use serde::Serialize;

use crate::models::{RunState, TrialDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrialAction {
    Continue,
    Metrics,
    MetricsPopout,
    Tensorboard,
    Logs,
}

impl TrialAction {
    pub const ALL: [TrialAction; 5] = [
        TrialAction::Continue,
        TrialAction::Metrics,
        TrialAction::MetricsPopout,
        TrialAction::Tensorboard,
        TrialAction::Logs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrialAction::Continue => "Continue Trial",
            TrialAction::Metrics => "View Metrics",
            TrialAction::MetricsPopout => "View Metrics Popout",
            TrialAction::Tensorboard => "View in Tensorboard",
            TrialAction::Logs => "Logs",
        }
    }

    /// Dashboard route the action navigates to, if it is a navigation.
    pub fn path(self, trial_id: i64) -> Option<String> {
        match self {
            TrialAction::Metrics | TrialAction::MetricsPopout => {
                Some(format!("/det/trial-metrics/{trial_id}"))
            }
            TrialAction::Logs => Some(format!("/det/trials/{trial_id}/logs")),
            TrialAction::Continue | TrialAction::Tensorboard => None,
        }
    }

    /// Whether the route opens in a new window.
    pub fn is_popout(self) -> bool {
        matches!(self, TrialAction::MetricsPopout | TrialAction::Logs)
    }
}

/// A terminal trial none of whose steps completed has no metrics and never
/// will.
pub fn trial_will_never_have_data(trial: &TrialDetails) -> bool {
    trial.state().is_terminal() && !trial.steps.iter().any(|s| s.state == RunState::Completed)
}

/// Actions to offer for a trial, in display order.
pub fn available_actions(trial: &TrialDetails) -> Vec<TrialAction> {
    let no_data = trial_will_never_have_data(trial);
    TrialAction::ALL
        .into_iter()
        .filter(|a| !(no_data && *a == TrialAction::Tensorboard))
        .collect()
}
