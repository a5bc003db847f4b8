//! trialwatch CLI: serve snapshots, summarize experiments, watch trials.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use trialwatch::server::{serve, ServerConfig};
use trialwatch::storage::DirectorySource;
use trialwatch::{
    available_actions, ApiClient, DetailsSource, ExperimentSummary, TrialMetricsView,
    TrialMetricsWatcher, WatchConfig,
};

#[derive(Parser)]
#[command(
    name = "trw",
    about = "trialwatch: best checkpoints and live trial status for ML experiments",
    version,
    author
)]
struct Cli {
    /// YAML file with api_url / poll_interval_ms / request_timeout_ms
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the details API (overrides the config file)
    #[arg(long, global = true)]
    api: Option<String>,
    /// Also write logs to trw.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve experiment snapshots over the REST API
    Serve {
        /// Path to the snapshot directory
        #[arg(default_value = "./experiments")]
        dir: PathBuf,
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(long, short, default_value_t = 8080)]
        port: u16,
    },
    /// Show an experiment's summary: best validation, best checkpoint, ...
    Summary {
        experiment_id: i64,
        /// Read snapshots from this directory instead of the API
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// List the actions available for a trial
    Actions {
        trial_id: i64,
        /// Read snapshots from this directory instead of the API
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Poll a trial and print every change until interrupted
    Watch {
        trial_id: String,
        /// Read snapshots from this directory instead of the API
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Polling interval (overrides the config file)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Exit after this many printed updates
        #[arg(long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    let mut config = match &cli.config {
        Some(path) => WatchConfig::load(path)?,
        None => WatchConfig::default(),
    };
    if let Some(api) = cli.api {
        config = config.with_api_url(api);
    }

    match cli.command {
        Commands::Serve { dir, host, port } => {
            cmd_serve(dir, host, port).await?;
        }
        Commands::Summary { experiment_id, dir } => {
            let source = details_source(dir, &config)?;
            cmd_summary(source, experiment_id).await?;
        }
        Commands::Actions { trial_id, dir } => {
            let source = details_source(dir, &config)?;
            cmd_actions(source, trial_id).await?;
        }
        Commands::Watch { trial_id, dir, interval_ms, count } => {
            if let Some(ms) = interval_ms {
                config = config.with_poll_interval_ms(ms);
            }
            let source = details_source(dir, &config)?;
            cmd_watch(source, &trial_id, config.poll_interval(), count).await?;
        }
    }

    Ok(())
}

fn init_tracing(log_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let (file, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, "trw.log"));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    guard
}

fn details_source(dir: Option<PathBuf>, config: &WatchConfig) -> Result<Arc<dyn DetailsSource>> {
    let source: Arc<dyn DetailsSource> = match dir {
        Some(dir) => Arc::new(DirectorySource::new(dir)),
        None => Arc::new(ApiClient::from_config(config)?),
    };
    Ok(source)
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_serve(dir: PathBuf, host: String, port: u16) -> Result<()> {
    println!("trialwatch API");
    println!("   Snapshots: {}", dir.display());
    println!("   URL:       http://{}:{}/api/v1", host, port);
    println!();

    serve(ServerConfig {
        base_dir: dir,
        host,
        port,
    })
    .await
}

async fn cmd_summary(source: Arc<dyn DetailsSource>, experiment_id: i64) -> Result<()> {
    let experiment = source.get_experiment_details(experiment_id).await?;
    let summary = ExperimentSummary::from_experiment(&experiment);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Field", "Value"]);

    let dash = || "-".to_string();
    table.add_row([
        "Progress".to_string(),
        summary
            .progress_percent
            .map(|p| format!("{p:.0}%"))
            .unwrap_or_else(dash),
    ]);
    table.add_row([
        "Best Validation".to_string(),
        summary.best_validation_label().unwrap_or_else(dash),
    ]);
    table.add_row([
        "Best Checkpoint".to_string(),
        summary.best_checkpoint_label().unwrap_or_else(dash),
    ]);
    table.add_row([
        "Max Slots".to_string(),
        summary.max_slots.map(|s| s.to_string()).unwrap_or_else(dash),
    ]);
    table.add_row([
        "Start Time".to_string(),
        summary.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    table.add_row([
        "Duration".to_string(),
        summary.duration_secs.map(format_duration).unwrap_or_else(dash),
    ]);
    table.add_row(["Labels".to_string(), summary.labels.join(", ")]);

    println!("Experiment {} ({})", summary.experiment_id, summary.state);
    println!("{}", table);
    Ok(())
}

async fn cmd_actions(source: Arc<dyn DetailsSource>, trial_id: i64) -> Result<()> {
    let trial = source.get_trial_details(trial_id).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Action", "Route"]);
    for action in available_actions(&trial) {
        let route = match action.path(trial_id) {
            Some(p) if action.is_popout() => format!("{p} (popout)"),
            Some(p) => p,
            None => "-".to_string(),
        };
        table.add_row([action.label().to_string(), route]);
    }

    println!("Trial {} ({})", trial_id, trial.state());
    println!("{}", table);
    Ok(())
}

async fn cmd_watch(
    source: Arc<dyn DetailsSource>,
    trial_id: &str,
    interval: Duration,
    count: Option<usize>,
) -> Result<()> {
    let mut watcher = TrialMetricsWatcher::start(source, trial_id, interval)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(format!("Loading trial {}", watcher.trial_id()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut printed = 0usize;
    let mut last: Option<TrialMetricsView> = None;
    loop {
        let view = watcher.view();
        if last.as_ref() != Some(&view) {
            if !matches!(view, TrialMetricsView::Loading) {
                spinner.suspend(|| print_view(&view));
                printed += 1;
            }
            last = Some(view);
        }
        if count.is_some_and(|c| printed >= c) {
            break;
        }

        tokio::select! {
            changed = watcher.changed() => {
                if !changed {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    spinner.finish_and_clear();
    watcher.cancel();
    info!(trial = watcher.trial_id(), updates = printed, "Watch finished");
    Ok(())
}

fn print_view(view: &TrialMetricsView) {
    match view {
        TrialMetricsView::Loading => {}
        TrialMetricsView::NotFound { title, message } | TrialMetricsView::Failed { title, message } => {
            eprintln!("{title}: {message}");
        }
        TrialMetricsView::Ready { trial, experiment } => {
            let summary = ExperimentSummary::from_experiment(experiment);
            println!(
                "Trial {} [{}] batches={} | Experiment {} best checkpoint: {}",
                trial.id(),
                trial.state(),
                trial.trial.total_batches_processed,
                experiment.id,
                summary.best_checkpoint_label().unwrap_or_else(|| "-".to_string()),
            );
        }
    }
}

// ─── Utilities ────────────────────────────────────────────────────────────────

fn format_duration(secs: f64) -> String {
    let secs = secs as u64;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
