//! mooringd — the Mooring control-plane daemon.
//!
//! Single binary that assembles the control plane:
//! - SQLite metadata store
//! - Orchestrator client + synchronizer
//! - One lifecycle coordinator per resource kind
//! - REST API
//!
//! # Usage
//!
//! ```text
//! mooringd serve --config /etc/mooring/mooring.toml
//! mooringd serve --dry-run --listen 127.0.0.1:8080
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use mooring_cluster::{ClusterApi, HttpClusterApi, MemoryClusterApi, Synchronizer};
use mooring_coordinator::{
    Coordinator, MiddlewareStrategy, RouteStrategy, ServiceStrategy, VolumeStrategy,
    WorkloadStrategy,
};
use mooring_core::config::{MooringConfig, PolicyConfig};
use mooring_manifest::TranslatePolicy;
use mooring_store::{
    CatalogueStore, MiddlewareStore, RouteStore, ServiceStore, VolumeStore, WorkloadStore,
};

#[derive(Parser)]
#[command(name = "mooringd", about = "Mooring control-plane daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control-plane API server.
    Serve {
        /// Path to mooring.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address, e.g. 0.0.0.0:8080.
        #[arg(long)]
        listen: Option<String>,

        /// SQLite database file path.
        #[arg(long)]
        db: Option<String>,

        /// Orchestrator API base URL.
        #[arg(long)]
        cluster_url: Option<String>,

        /// Reconcile against an in-memory cluster instead of a real one.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mooringd=debug,mooring=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            db,
            cluster_url,
            dry_run,
        } => run_serve(config, listen, db, cluster_url, dry_run).await,
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    listen: Option<String>,
    db: Option<String>,
    cluster_url: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    info!("Mooring daemon starting");

    let config = match &config_path {
        Some(path) => MooringConfig::from_file(path)?,
        None => MooringConfig::default(),
    };

    let listen = listen.unwrap_or_else(|| config.listen());
    let db_path = db.unwrap_or_else(|| config.store_path());
    let policy = translate_policy(config.policy.as_ref());

    // ── Metadata store ─────────────────────────────────────────

    let pool = mooring_store::open(Path::new(&db_path)).await?;
    info!(path = %db_path, "metadata store opened");

    // ── Orchestrator client ────────────────────────────────────

    let cluster = config.cluster.as_ref();
    let dry_run = dry_run || cluster.and_then(|c| c.dry_run).unwrap_or(false);
    let api: Arc<dyn ClusterApi> = if dry_run {
        info!("dry-run mode, using in-memory cluster");
        Arc::new(MemoryClusterApi::new())
    } else {
        let base_url = cluster_url
            .or_else(|| cluster.and_then(|c| c.base_url.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!("cluster base URL required (set [cluster].base_url or --dry-run)")
            })?;
        let token = cluster.and_then(|c| c.token.clone());
        info!(%base_url, "orchestrator client initialized");
        Arc::new(HttpClusterApi::new(base_url, token))
    };
    let sync = Synchronizer::new(api);

    // ── Coordinators ───────────────────────────────────────────

    let middleware_store = Arc::new(MiddlewareStore::new(pool.clone()));
    let state = mooring_api::ApiState {
        workloads: Arc::new(Coordinator::new(
            WorkloadStrategy::new(policy.clone()),
            sync.clone(),
            Arc::new(WorkloadStore::new(pool.clone())),
        )),
        middlewares: Arc::new(Coordinator::new(
            MiddlewareStrategy::new(policy.clone()),
            sync.clone(),
            middleware_store.clone(),
        )),
        services: Arc::new(Coordinator::new(
            ServiceStrategy::new(policy.clone()),
            sync.clone(),
            Arc::new(ServiceStore::new(pool.clone())),
        )),
        routes: Arc::new(Coordinator::new(
            RouteStrategy::new(policy.clone()),
            sync.clone(),
            Arc::new(RouteStore::new(pool.clone())),
        )),
        volumes: Arc::new(Coordinator::new(
            VolumeStrategy::new(policy),
            sync,
            Arc::new(VolumeStore::new(pool.clone())),
        )),
        middleware_store,
        catalogue: Arc::new(CatalogueStore::new(pool)),
    };
    info!("coordinators initialized");

    // ── API server ─────────────────────────────────────────────

    let router = mooring_api::build_router(state);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(%listen, "API server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("Mooring daemon stopped");
    Ok(())
}

/// Compiled-in policy defaults, overridden field by field from config.
fn translate_policy(overrides: Option<&PolicyConfig>) -> TranslatePolicy {
    let mut policy = TranslatePolicy::default();
    if let Some(overrides) = overrides {
        if let Some(ratio) = overrides.workload_request_ratio {
            policy.workload_request_ratio = ratio;
        }
        if let Some(ratio) = overrides.middleware_request_ratio {
            policy.middleware_request_ratio = ratio;
        }
        if let Some(class) = &overrides.ingress_class {
            policy.ingress_class = class.clone();
        }
        if let Some(provisioner) = &overrides.storage_provisioner {
            policy.storage_provisioner = provisioner.clone();
        }
    }
    policy
}
