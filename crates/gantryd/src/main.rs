//! gantryd — the Gantry daemon.
//!
//! Single binary that assembles the autoscaling control plane:
//! - State store (redb) for scaling events
//! - Policy store (in-memory, optionally seeded from a JSON file)
//! - Orchestrator HTTP client
//! - Metric provider registry (Prometheus, InfluxDB)
//! - Deployment watcher + tracker
//! - Scaler and evaluation scheduler
//!
//! # Usage
//!
//! ```text
//! gantryd run --orchestrator-addr http://127.0.0.1:4646 \
//!     --data-dir /var/lib/gantry --policy-file policies.json
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::info;

use gantry_autoscale::DecisionEngine;
use gantry_deploy::{DeploymentTracker, DeploymentWatcher};
use gantry_metrics::{InfluxDbProvider, PrometheusProvider, ProviderRegistry};
use gantry_orchestrator::HttpOrchestrator;
use gantry_policy::GroupScalingPolicy;
use gantry_scale::Scaler;
use gantry_scheduler::{Evaluator, Standalone};
use gantry_state::{MemoryPolicyStore, PolicyStore, StateStore};

/// Buffered deployment updates between the watcher and the tracker.
const DEPLOYMENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "gantryd", about = "Gantry autoscaling daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the autoscaler against an orchestrator.
    Run(RunOpts),
}

#[derive(Args)]
struct RunOpts {
    /// Orchestrator API address.
    #[arg(long, default_value = "http://127.0.0.1:4646")]
    orchestrator_addr: String,

    /// Data directory for persistent state.
    #[arg(long, default_value = "/var/lib/gantry")]
    data_dir: PathBuf,

    /// Evaluation interval in seconds.
    #[arg(long, default_value = "60")]
    eval_interval: u64,

    /// Worker pool size: jobs evaluated concurrently per round.
    #[arg(long, default_value = "10")]
    pool_size: usize,

    /// Disable strict policy checking on triggers.
    #[arg(long)]
    no_strict: bool,

    /// JSON file of scaling policies, keyed job -> group.
    #[arg(long)]
    policy_file: Option<PathBuf>,

    /// Prometheus server address for external checks.
    #[arg(long)]
    prometheus_addr: Option<String>,

    /// InfluxDB server address for external checks.
    #[arg(long)]
    influxdb_addr: Option<String>,

    /// InfluxDB database queried by external checks.
    #[arg(long, default_value = "gantry")]
    influxdb_database: String,

    /// Blocking-query wait for the deployment watcher, in seconds.
    #[arg(long, default_value = "60")]
    deployment_watch_wait: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gantryd=debug,gantry=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(opts) => run(opts).await,
    }
}

async fn run(opts: RunOpts) -> anyhow::Result<()> {
    info!("Gantry daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&opts.data_dir)?;
    let db_path = opts.data_dir.join("gantry.redb");

    // ── Initialize subsystems ──────────────────────────────────

    // State store.
    let state = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Policy store.
    let policies = Arc::new(MemoryPolicyStore::new());
    if let Some(path) = &opts.policy_file {
        let loaded = seed_policies(policies.as_ref(), path).await?;
        info!(path = ?path, count = loaded, "policies loaded");
    }

    // Orchestrator client.
    let client = Arc::new(HttpOrchestrator::new(&opts.orchestrator_addr));
    info!(addr = %opts.orchestrator_addr, "orchestrator client initialized");

    // Metric providers.
    let mut registry = ProviderRegistry::new();
    if let Some(addr) = &opts.prometheus_addr {
        registry.register("prometheus", Arc::new(PrometheusProvider::new(addr)));
        info!(%addr, "prometheus provider registered");
    }
    if let Some(addr) = &opts.influxdb_addr {
        registry.register(
            "influxdb",
            Arc::new(InfluxDbProvider::new(addr, &opts.influxdb_database)),
        );
        info!(%addr, database = %opts.influxdb_database, "influxdb provider registered");
    }
    let engine = DecisionEngine::new(Arc::new(registry));

    // Deployment tracking.
    let tracker = Arc::new(DeploymentTracker::new());
    let (update_tx, update_rx) = mpsc::channel(DEPLOYMENT_CHANNEL_CAPACITY);
    let watcher = DeploymentWatcher::new(
        client.clone(),
        update_tx,
        Duration::from_secs(opts.deployment_watch_wait),
    );

    // Scaler.
    let scaler = Arc::new(Scaler::new(client.clone(), state.clone()).with_strict(!opts.no_strict));
    info!(strict = !opts.no_strict, "scaler initialized");

    // Evaluation scheduler.
    let evaluator = Evaluator::new(
        policies,
        client,
        engine,
        scaler,
        tracker.clone(),
        state,
        Arc::new(Standalone),
        opts.pool_size,
    );
    info!(
        interval = opts.eval_interval,
        pool_size = opts.pool_size,
        "evaluator initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tracker_shutdown = shutdown_rx.clone();
    let watcher_shutdown = shutdown_rx.clone();
    let evaluator_shutdown = shutdown_rx.clone();

    // ── Start background tasks ─────────────────────────────────

    let tracker_handle = tokio::spawn(async move {
        tracker.run(update_rx, tracker_shutdown).await;
    });

    let watcher_handle = tokio::spawn(async move {
        watcher.run(watcher_shutdown).await;
    });

    let interval = Duration::from_secs(opts.eval_interval);
    let evaluator_handle = tokio::spawn(async move {
        evaluator.run(interval, evaluator_shutdown).await;
    });

    // Graceful shutdown on Ctrl-C.
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = evaluator_handle.await;
    let _ = watcher_handle.await;
    let _ = tracker_handle.await;

    info!("Gantry daemon stopped");
    Ok(())
}

/// Load a JSON policy file (`{job: {group: policy}}`) into the store.
///
/// Every policy goes through the store's write path, so validation and
/// default-merging apply exactly as they would for an API write.
async fn seed_policies(store: &dyn PolicyStore, path: &PathBuf) -> anyhow::Result<usize> {
    let raw = std::fs::read(path)?;
    let parsed: HashMap<String, HashMap<String, GroupScalingPolicy>> =
        serde_json::from_slice(&raw)?;

    let mut count = 0;
    for (job, groups) in parsed {
        for (group, policy) in groups {
            store.put_job_group_policy(&job, &group, policy).await?;
            count += 1;
        }
    }
    Ok(count)
}
