//! Print the summary of an experiment snapshot stored on disk.
//!
//! Usage: cargo run -p trialwatch-core --example summarize -- ./experiments 1

use std::path::PathBuf;

use trialwatch_core::{storage, ExperimentSummary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let base_dir = PathBuf::from(args.next().unwrap_or_else(|| "./experiments".to_string()));
    let experiment_id: i64 = args.next().unwrap_or_else(|| "1".to_string()).parse()?;

    let experiment = storage::load_experiment(&base_dir, experiment_id)?;
    let summary = ExperimentSummary::from_experiment(&experiment);

    println!("Experiment {} ({})", summary.experiment_id, summary.state);
    println!(
        "Best validation: {}",
        summary.best_validation_label().unwrap_or_else(|| "-".into())
    );
    println!(
        "Best checkpoint: {}",
        summary.best_checkpoint_label().unwrap_or_else(|| "-".into())
    );

    Ok(())
}
