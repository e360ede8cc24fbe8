//! Result Materializer: copies a provider-hosted image into the Artifact
//! Store and hands back a long-lived URL.
//!
//! Persistence is best-effort. Any failure returns the provider's own URL.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::photos::artifacts::{ArtifactStore, StoreError, STORED_URL_TTL};
use crate::photos::provider::{ImageProvider, ProviderError};

const OUTPUT_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("download failed: {0}")]
    Download(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cancelled before the artifact was stored")]
    Cancelled,
}

/// Where the caller should point users for a generated image.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub url: String,
    /// Storage path when the copy succeeded; `None` means `url` is the
    /// provider's short-lived URL.
    pub stored_path: Option<String>,
}

pub async fn materialize_image(
    provider: &dyn ImageProvider,
    store: &dyn ArtifactStore,
    provider_url: &str,
    target_path: &str,
    cancel: &CancellationToken,
) -> Materialized {
    match persist(provider, store, provider_url, target_path, cancel).await {
        Ok(url) => {
            info!("Stored generated image at '{target_path}'");
            Materialized {
                url,
                stored_path: Some(target_path.to_string()),
            }
        }
        Err(e) => {
            warn!("Keeping provider URL, could not store '{target_path}': {e}");
            Materialized {
                url: provider_url.to_string(),
                stored_path: None,
            }
        }
    }
}

async fn persist(
    provider: &dyn ImageProvider,
    store: &dyn ArtifactStore,
    provider_url: &str,
    target_path: &str,
    cancel: &CancellationToken,
) -> Result<String, PersistenceError> {
    let bytes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PersistenceError::Cancelled),
        bytes = provider.download(provider_url) => bytes?,
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PersistenceError::Cancelled),
        uploaded = store.upload(target_path, bytes, OUTPUT_CONTENT_TYPE) => uploaded?,
    }

    Ok(store.signed_url(target_path, STORED_URL_TTL).await?)
}
