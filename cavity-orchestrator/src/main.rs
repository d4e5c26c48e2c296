use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use cavity_orchestrator::api::{self, AppState};
use cavity_orchestrator::config::Config;
use cavity_orchestrator::db;
use cavity_orchestrator::dispatcher::Dispatcher;
use cavity_orchestrator::lifecycle::LifecycleController;
use cavity_orchestrator::repository::{InMemorySimulationStore, PgSimulationStore, SimulationStore};
use cavity_orchestrator::supervisor::ProcessSupervisor;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long in-flight solver runs get to finish after the server stops
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cavity_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cavity Orchestrator...");

    let config = Config::from_env()?;

    let store: Arc<dyn SimulationStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;
            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgSimulationStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, simulations are kept in memory only");
            Arc::new(InMemorySimulationStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    tracing::info!(
        "Solver: {} {}, results in {}",
        config.solver_program,
        config.solver_args.join(" "),
        config.output_dir.display()
    );

    let controller = LifecycleController::new(
        Arc::clone(&store),
        Arc::new(ProcessSupervisor::new(config.solver_command())),
        config.artifact_layout(),
    );
    let dispatcher = Arc::new(Dispatcher::start(Arc::new(controller)));

    // Build router with all API endpoints, plus the result videos
    let app = api::create_router(AppState::new(store, Arc::clone(&dispatcher))).nest_service(
        config.result_url_prefix.trim_end_matches('/'),
        ServeDir::new(&config.output_dir),
    );

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        "Server stopped, waiting for {} simulation run(s)",
        dispatcher.active_runs()
    );
    if tokio::time::timeout(DRAIN_TIMEOUT, dispatcher.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            "{} simulation run(s) still active after {:?}, exiting anyway",
            dispatcher.active_runs(),
            DRAIN_TIMEOUT
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
