mod config;
mod cover_letters;
mod db;
mod errors;
mod generation;
mod jobs;
mod llm_client;
mod models;
mod multipart;
mod photos;
mod resume;
mod resume_bullets;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::photos::artifacts::{ArtifactStore, S3ArtifactStore};
use crate::photos::orchestrator::{ModelVersions, Orchestrator};
use crate::photos::provider::{ImageProvider, ReplicateClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobpilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(S3ArtifactStore::new(s3, config.s3_bucket.clone()));
    info!("Artifact store initialized (bucket: {})", config.s3_bucket);

    // Initialize image provider; without a token generation runs degraded
    let provider: Option<Arc<dyn ImageProvider>> = match &config.replicate_api_token {
        Some(token) => {
            info!("Replicate client initialized");
            Some(Arc::new(ReplicateClient::new(token.clone())?))
        }
        None => {
            warn!("REPLICATE_API_TOKEN not set; photo generation returns originals");
            None
        }
    };

    let orchestrator = Orchestrator::new(
        provider,
        artifacts.clone(),
        ModelVersions {
            enhance: config.replicate_enhance_version.clone(),
            headshot: config.replicate_headshot_version.clone(),
        },
        config.poll_interval,
    );

    // Initialize LLM client
    let llm = match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(LlmClient::new(key.clone())?)
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; text generation endpoints are disabled");
            None
        }
    };

    let shutdown = CancellationToken::new();

    // Build app state
    let state = AppState {
        db,
        artifacts,
        orchestrator,
        llm,
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM and cancels in-flight generations.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received, cancelling in-flight generations");
    shutdown.cancel();
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "jobpilot-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
