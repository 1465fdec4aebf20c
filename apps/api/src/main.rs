mod agents;
mod applications;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod orchestrator;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::default_agents;
use crate::applications::store::PgApplicationStore;
use crate::config::{ApiConfig, Config, RunMode};
use crate::db::create_pool;
use crate::jobs::chain::ChainStore;
use crate::jobs::file_store::GithubFileStore;
use crate::jobs::store::JobStore;
use crate::llm_client::GeminiClient;
use crate::orchestrator::outputs::{OutputStore, RedisOutputs, SharedOutputs};
use crate::orchestrator::Orchestrator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Orbit API v{} (run mode: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.run_mode
    );

    // Agent output store: Redis when configured, otherwise in-process
    let outputs: Arc<dyn OutputStore> = match &config.redis_url {
        Some(url) => {
            info!("Agent outputs stored in Redis");
            Arc::new(RedisOutputs::new(url)?)
        }
        None => Arc::new(SharedOutputs::new()),
    };

    let orchestrator = if config.run_mode.runs_agents() {
        let gateway = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
        )?);
        info!("Agent gateway initialized (model: {})", gateway.model());
        let agents = default_agents(gateway, config.hr_data_path.clone());
        Some(
            Orchestrator::new(agents, outputs.clone(), config.orchestration_interval)
                .with_agent_timeout(config.agent_timeout),
        )
    } else {
        None
    };

    match (config.run_mode, orchestrator, config.api.clone()) {
        (RunMode::Orchestrator, Some(orchestrator), _) => {
            info!("Running orchestrator only");
            tokio::select! {
                _ = orchestrator.run_forever() => {}
                _ = shutdown_signal() => {}
            }
        }
        (_, orchestrator, Some(api)) => {
            if let Some(orchestrator) = orchestrator {
                orchestrator.spawn_dedicated()?;
                info!("Orchestrator started on its own thread");
            }
            serve(&config, api, outputs).await?;
        }
        (mode, _, None) => anyhow::bail!("Run mode {mode:?} has no API configuration"),
    }

    info!("Shut down cleanly");
    Ok(())
}

async fn serve(config: &Config, api: ApiConfig, outputs: Arc<dyn OutputStore>) -> Result<()> {
    // Initialize PostgreSQL
    let db = create_pool(&api.database_url).await?;
    let applications = Arc::new(PgApplicationStore::new(db));

    // Remote repository backing the jobs and chain documents
    let files = Arc::new(GithubFileStore::new(&api.github)?);
    info!("File store initialized ({}@{})", api.github.repo, api.github.branch);

    // Initialize model gateways
    let model = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
    )?;
    let chat = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.gemini_chat_model.clone(),
    )?;
    info!("LLM clients initialized (models: {}, {})", model.model(), chat.model());

    // Build app state
    let state = AppState {
        outputs,
        jobs: JobStore::new(files.clone(), api.github.jobs_file_path.clone()),
        chain: ChainStore::new(files, api.github.chain_file_path.clone()),
        applications,
        model: Arc::new(model),
        chat: Arc::new(chat),
        max_upload_bytes: api.max_upload_bytes,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", api.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
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
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
