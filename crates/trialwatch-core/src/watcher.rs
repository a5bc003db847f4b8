//! Live view of one trial together with the experiment it belongs to.
//!
//! The trial is polled on an interval; its parent experiment is fetched once
//! whenever the trial reports a new experiment id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::DetailsSource;
use crate::error::{Result, TrackerError};
use crate::models::{Experiment, TrialDetails};
use crate::poll::{start_polling, PollHandle, ResourceState};

#[derive(Debug, Clone, PartialEq)]
pub enum TrialMetricsView {
    Loading,
    NotFound { title: String, message: String },
    Failed { title: String, message: String },
    Ready {
        trial: TrialDetails,
        experiment: Experiment,
    },
}

pub struct TrialMetricsWatcher {
    trial_id: i64,
    trial: PollHandle<TrialDetails>,
    trial_rx: watch::Receiver<ResourceState<TrialDetails>>,
    experiment_rx: watch::Receiver<Option<Experiment>>,
    cancel: CancellationToken,
    _loader: JoinHandle<()>,
}

/// Parse a trial id as it arrives from a route or the command line.
pub fn parse_trial_id(param: &str) -> Result<i64> {
    param.trim().parse::<i64>().map_err(|_| TrackerError::InvalidId {
        kind: "Trial",
        value: param.to_string(),
    })
}

impl TrialMetricsWatcher {
    /// Start watching. Fails without polling anything if `trial_id_param` is
    /// not an integer.
    pub fn start(
        source: Arc<dyn DetailsSource>,
        trial_id_param: &str,
        period: Duration,
    ) -> Result<Self> {
        let trial_id = parse_trial_id(trial_id_param)?;

        let fetch_source = source.clone();
        let trial = start_polling(
            move |id: i64| {
                let source = fetch_source.clone();
                async move { source.get_trial_details(id).await }
            },
            trial_id,
            period,
        );

        let cancel = CancellationToken::new();
        let (experiment_tx, experiment_rx) = watch::channel(None);
        let loader = tokio::spawn(load_experiment(
            source,
            trial.subscribe(),
            experiment_tx,
            cancel.clone(),
        ));

        Ok(Self {
            trial_id,
            trial_rx: trial.subscribe(),
            trial,
            experiment_rx,
            cancel,
            _loader: loader,
        })
    }

    pub fn trial_id(&self) -> i64 {
        self.trial_id
    }

    pub fn fetch_count(&self) -> u64 {
        self.trial.fetch_count()
    }

    pub fn view(&self) -> TrialMetricsView {
        match self.trial.state() {
            ResourceState::Loading => TrialMetricsView::Loading,
            ResourceState::NotFound(message) => TrialMetricsView::NotFound {
                title: format!("Unable to find Trial {}", self.trial_id),
                message,
            },
            ResourceState::Errored(message) => TrialMetricsView::Failed {
                title: format!("Unable to fetch Trial {}", self.trial_id),
                message,
            },
            ResourceState::Loaded(trial) => match self.experiment_rx.borrow().as_ref() {
                Some(exp) if exp.id == trial.experiment_id() => TrialMetricsView::Ready {
                    trial,
                    experiment: exp.clone(),
                },
                _ => TrialMetricsView::Loading,
            },
        }
    }

    /// Wait until either the trial or the experiment changes. Returns `false`
    /// once the watcher has stopped.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            r = self.trial_rx.changed() => r.is_ok(),
            r = self.experiment_rx.changed() => r.is_ok(),
        }
    }

    /// Stop polling. Safe to call more than once.
    pub fn cancel(&self) {
        self.trial.cancel();
        self.cancel.cancel();
    }
}

impl Drop for TrialMetricsWatcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn load_experiment(
    source: Arc<dyn DetailsSource>,
    mut trial_rx: watch::Receiver<ResourceState<TrialDetails>>,
    experiment_tx: watch::Sender<Option<Experiment>>,
    cancel: CancellationToken,
) {
    let mut loaded_for: Option<i64> = None;

    loop {
        let experiment_id = trial_rx
            .borrow_and_update()
            .loaded()
            .map(TrialDetails::experiment_id);

        if let Some(id) = experiment_id.filter(|id| loaded_for != Some(*id)) {
            debug!(experiment = id, "Loading parent experiment");
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = source.get_experiment_details(id) => r,
            };
            match result {
                Ok(experiment) => {
                    loaded_for = Some(id);
                    experiment_tx.send_replace(Some(experiment));
                }
                // Retried on the next trial update.
                Err(e) => warn!(experiment = id, error = %e, "Failed to load experiment"),
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = trial_rx.changed() => {
                if r.is_err() {
                    break;
                }
            }
        }
    }
}
