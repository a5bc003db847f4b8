//! Snapshot storage: experiments as YAML files on disk.
//!
//! Layout:
//!
//! ```text
//! {base_dir}/{experiment_id}/experiment.yaml      Experiment (with trials)
//! {base_dir}/{experiment_id}/steps/{trial_id}.yaml  Vec<Step> of one trial
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::client::DetailsSource;
use crate::error::{Result, TrackerError};
use crate::models::{Experiment, Step, TrialDetails};

// ─── Directory helpers ────────────────────────────────────────────────────────

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn experiment_dir(base_dir: &Path, experiment_id: i64) -> PathBuf {
    base_dir.join(experiment_id.to_string())
}

fn steps_path(base_dir: &Path, experiment_id: i64, trial_id: i64) -> PathBuf {
    experiment_dir(base_dir, experiment_id)
        .join("steps")
        .join(format!("{trial_id}.yaml"))
}

/// Ids of all experiments under `base_dir`, ascending. Only directories named
/// exactly as `experiment_dir` names them (`7`, not `07` or `+7`) count.
pub fn list_experiments(base_dir: &Path) -> Result<Vec<i64>> {
    if !base_dir.exists() {
        return Ok(vec![]);
    }
    let mut ids = vec![];
    for entry in fs::read_dir(base_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Ok(id) = name.parse::<i64>() else {
            continue;
        };
        if name == id.to_string() && entry.path().join("experiment.yaml").exists() {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

// ─── YAML I/O ─────────────────────────────────────────────────────────────────

pub fn save_yaml<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let content = serde_yaml::to_string(data)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

// ─── Experiments and trials ──────────────────────────────────────────────────

pub fn save_experiment(base_dir: &Path, experiment: &Experiment) -> Result<()> {
    let path = experiment_dir(base_dir, experiment.id).join("experiment.yaml");
    save_yaml(&path, experiment)
}

pub fn load_experiment(base_dir: &Path, experiment_id: i64) -> Result<Experiment> {
    let path = experiment_dir(base_dir, experiment_id).join("experiment.yaml");
    if !path.exists() {
        return Err(TrackerError::experiment_not_found(experiment_id));
    }
    load_yaml(&path)
}

pub fn save_trial_steps(base_dir: &Path, experiment_id: i64, trial_id: i64, steps: &[Step]) -> Result<()> {
    save_yaml(&steps_path(base_dir, experiment_id, trial_id), &steps)
}

/// Find a trial across all stored experiments and attach its steps (empty
/// when no steps file exists). Unreadable experiments are skipped.
pub fn load_trial_details(base_dir: &Path, trial_id: i64) -> Result<TrialDetails> {
    for experiment_id in list_experiments(base_dir)? {
        let experiment = match load_experiment(base_dir, experiment_id) {
            Ok(experiment) => experiment,
            Err(e) => {
                warn!(experiment = experiment_id, error = %e, "Skipping unreadable experiment");
                continue;
            }
        };
        if let Some(trial) = experiment.trial(trial_id) {
            let path = steps_path(base_dir, experiment_id, trial_id);
            let steps = if path.exists() { load_yaml(&path)? } else { vec![] };
            return Ok(TrialDetails {
                trial: trial.clone(),
                steps,
            });
        }
    }
    Err(TrackerError::trial_not_found(trial_id))
}

/// Serves details straight from a snapshot directory, without a server.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl DetailsSource for DirectorySource {
    async fn get_experiment_details(&self, id: i64) -> Result<Experiment> {
        load_experiment(&self.base_dir, id)
    }

    async fn get_trial_details(&self, id: i64) -> Result<TrialDetails> {
        load_trial_details(&self.base_dir, id)
    }
}
