use std::sync::Arc;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::photos::artifacts::ArtifactStore;
use crate::photos::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub orchestrator: Orchestrator,
    /// `None` when `ANTHROPIC_API_KEY` is unset.
    pub llm: Option<LlmClient>,
    /// Cancelled on shutdown. Generations run under child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn llm(&self) -> Result<&LlmClient, AppError> {
        self.llm.as_ref().ok_or(AppError::LlmUnconfigured)
    }
}
