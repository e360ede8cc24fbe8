//! Generation Orchestrator: runs one photo generation end to end.
//!
//! Flow: sign source URL → provider create → (poll until terminal) →
//!       materialize output → outcome.
//!
//! Without a provider credential the orchestrator runs in degraded mode and
//! returns a freshly signed URL of the source image, flagged as such.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::photos::artifacts::{
    derive_output_path, ArtifactStore, StoreError, SOURCE_URL_TTL, STORED_URL_TTL,
};
use crate::photos::materializer::materialize_image;
use crate::photos::options::{build_prompt, GenerationOptions, HEADSHOT_NEGATIVE_PROMPT};
use crate::photos::poll::{poll_until_terminal, PollOutcome, PollPolicy};
use crate::photos::provider::{ImageProvider, PredictionRequest, ProviderError, ProviderReply};

/// Service marker recorded when no provider was called.
pub const DEGRADED_SERVICE: &str = "none (development)";

const ENHANCE_MAX_ATTEMPTS: u32 = 30;
const HEADSHOT_MAX_ATTEMPTS: u32 = 60;

// ────────────────────────────────────────────────────────────────────────────
// Request / outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTask {
    /// Face restoration and upscaling of the uploaded photo.
    Enhance,
    /// Identity-preserving professional headshot.
    Headshot(GenerationOptions),
}

impl GenerationTask {
    pub fn service(&self) -> &'static str {
        match self {
            Self::Enhance => "replicate-codeformer",
            Self::Headshot(_) => "replicate-photomaker",
        }
    }

    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Enhance => ENHANCE_MAX_ATTEMPTS,
            Self::Headshot(_) => HEADSHOT_MAX_ATTEMPTS,
        }
    }

    /// Enhancements overwrite one slot per source; headshots get a fresh
    /// path per run so earlier generations survive.
    fn output_suffix(&self, now_millis: i64) -> String {
        match self {
            Self::Enhance => "-enhanced".to_string(),
            Self::Headshot(_) => format!("-generated-{now_millis}"),
        }
    }

    fn input(&self, image_url: &str) -> serde_json::Value {
        match self {
            Self::Enhance => json!({
                "image": image_url,
                "codeformer_fidelity": 0.7,
                "background_enhance": true,
                "face_upsample": true,
                "upscale": 2,
            }),
            Self::Headshot(options) => json!({
                "input_image": image_url,
                "prompt": build_prompt(options),
                "negative_prompt": HEADSHOT_NEGATIVE_PROMPT,
                "num_steps": 30,
                "style_strength_ratio": 30,
                "guidance_scale": 7.5,
                "num_outputs": 1,
            }),
        }
    }
}

/// The stored photo a generation starts from.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    pub storage_path: String,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub record_id: Uuid,
    pub source: SourceArtifact,
    pub task: GenerationTask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub output_url: String,
    pub service: &'static str,
    pub degraded: bool,
    /// Artifact Store path behind `output_url`. `None` means `output_url`
    /// is the provider's own short-lived URL.
    pub stored_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Image provider unreachable: {0}")]
    ProviderUnreachable(String),

    #[error("Image provider rejected the request (status {status}): {message}")]
    ProviderRejected { status: u16, message: String },

    #[error("Image provider returned an invalid response: {0}")]
    ProviderResponseInvalid(String),

    #[error("Generation failed: {0}")]
    ProviderFailed(String),

    #[error("Generation timed out after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    #[error("Source photo unavailable: {0}")]
    SourceUnavailable(#[source] StoreError),

    #[error("Generation cancelled")]
    Cancelled,
}

impl From<ProviderError> for GenerationError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unreachable(msg) => Self::ProviderUnreachable(msg),
            ProviderError::Rejected { status, message } => Self::ProviderRejected { status, message },
            ProviderError::ResponseInvalid(msg) => Self::ProviderResponseInvalid(msg),
        }
    }
}

/// Replicate model versions per task.
#[derive(Debug, Clone)]
pub struct ModelVersions {
    pub enhance: String,
    pub headshot: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Orchestrator {
    /// `None` selects degraded mode.
    provider: Option<Arc<dyn ImageProvider>>,
    store: Arc<dyn ArtifactStore>,
    versions: ModelVersions,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        provider: Option<Arc<dyn ImageProvider>>,
        store: Arc<dyn ArtifactStore>,
        versions: ModelVersions,
        poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            versions,
            poll_interval,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.provider.is_none()
    }

    /// Runs one generation to a single terminal outcome.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        let task = request.task;

        let Some(provider) = self.provider.as_deref() else {
            warn!(
                "No image provider configured, returning original photo for {}",
                request.record_id
            );
            // Presigning is local, so degraded mode stays off the network.
            let output_url = self
                .store
                .signed_url(&request.source.storage_path, STORED_URL_TTL)
                .await
                .map_err(GenerationError::SourceUnavailable)?;
            return Ok(GenerationOutcome {
                output_url,
                service: DEGRADED_SERVICE,
                degraded: true,
                stored_path: Some(request.source.storage_path.clone()),
            });
        };

        // Step 1: URL the provider can read the source photo from
        let source_url = self
            .store
            .signed_url(&request.source.storage_path, SOURCE_URL_TTL)
            .await
            .map_err(GenerationError::SourceUnavailable)?;

        // Step 2: Create the prediction
        let prediction = PredictionRequest {
            version: self.version_for(&task).to_string(),
            input: task.input(&source_url),
        };
        info!(
            "Submitting {} generation for photo {}",
            task.service(),
            request.record_id
        );

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
            reply = provider.create(&prediction) => reply?,
        };

        // Step 3: Resolve to a provider-hosted output
        let provider_url = match reply {
            ProviderReply::Ready { output_url } => output_url,
            ProviderReply::Failed { message } => {
                error!("Generation for photo {} failed: {message}", request.record_id);
                return Err(GenerationError::ProviderFailed(message));
            }
            ProviderReply::Pending(job) => {
                info!(
                    "Provider job {} pending for photo {}, polling",
                    job.id, request.record_id
                );
                let policy = PollPolicy {
                    interval: self.poll_interval,
                    max_attempts: task.max_attempts(),
                };
                match poll_until_terminal(provider, job, policy, cancel).await? {
                    PollOutcome::Succeeded { output_url } => output_url,
                    PollOutcome::Failed { message } => {
                        error!("Generation for photo {} failed: {message}", request.record_id);
                        return Err(GenerationError::ProviderFailed(message));
                    }
                    PollOutcome::TimedOut { attempts } => {
                        error!(
                            "Generation for photo {} timed out after {attempts} polls",
                            request.record_id
                        );
                        return Err(GenerationError::PollTimeout { attempts });
                    }
                    PollOutcome::Cancelled => return Err(GenerationError::Cancelled),
                }
            }
        };

        // Step 4: Copy into the Artifact Store (best-effort)
        let target_path = derive_output_path(
            &request.source.storage_path,
            &task.output_suffix(Utc::now().timestamp_millis()),
        );
        let materialized = materialize_image(
            provider,
            self.store.as_ref(),
            &provider_url,
            &target_path,
            cancel,
        )
        .await;

        Ok(GenerationOutcome {
            output_url: materialized.url,
            service: task.service(),
            degraded: false,
            stored_path: materialized.stored_path,
        })
    }

    fn version_for(&self, task: &GenerationTask) -> &str {
        match task {
            GenerationTask::Enhance => &self.versions.enhance,
            GenerationTask::Headshot(_) => &self.versions.headshot,
        }
    }
}
