//! Image provider client.
//!
//! `ImageProvider` is the seam the orchestrator talks to. `ReplicateClient`
//! is the production implementation against the Replicate predictions API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const REPLICATE_API_URL: &str = "https://api.replicate.com/v1/predictions";
/// How long Replicate may hold the create call open before answering with a
/// pending prediction.
const SYNC_WAIT_SECS: u32 = 60;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One provider-side unit of work, alive until the orchestrator resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderJob {
    pub id: String,
    pub status: JobStatus,
    pub poll_url: String,
    pub output_url: Option<String>,
    pub error: Option<String>,
}

/// What the provider said to a create call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    Ready { output_url: String },
    Pending(ProviderJob),
    Failed { message: String },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider response invalid: {0}")]
    ResponseInvalid(String),
}

/// A create call: model version plus model-specific input.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: serde_json::Value,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Submits a new prediction.
    async fn create(&self, request: &PredictionRequest) -> Result<ProviderReply, ProviderError>;

    /// Re-reads the status of a pending job.
    async fn fetch(&self, job: &ProviderJob) -> Result<ProviderJob, ProviderError>;

    /// Downloads a produced artifact.
    async fn download(&self, url: &str) -> Result<Bytes, ProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

#[derive(Debug, Deserialize)]
struct ReplicateErrorBody {
    detail: String,
}

impl Prediction {
    fn parse(body: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(body)
            .map_err(|e| ProviderError::ResponseInvalid(format!("unreadable prediction: {e}")))
    }

    fn job_status(&self) -> Result<JobStatus, ProviderError> {
        match self.status.as_str() {
            "starting" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" | "canceled" => Ok(JobStatus::Failed),
            other => Err(ProviderError::ResponseInvalid(format!(
                "unknown prediction status '{other}'"
            ))),
        }
    }

    fn first_output(&self) -> Option<String> {
        let url = match &self.output {
            Some(PredictionOutput::One(url)) => Some(url.clone()),
            Some(PredictionOutput::Many(urls)) => urls.first().cloned(),
            None => None,
        };
        url.filter(|url| !url.is_empty())
    }

    fn error_message(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => format!("prediction {}", self.status),
            Some(other) => other.to_string(),
        }
    }

    /// Converts the prediction into a job, using `known_poll_url` when the
    /// provider omits `urls.get`.
    fn into_job(self, known_poll_url: Option<&str>) -> Result<ProviderJob, ProviderError> {
        let status = self.job_status()?;
        let output_url = self.first_output();

        if status == JobStatus::Succeeded && output_url.is_none() {
            return Err(ProviderError::ResponseInvalid(format!(
                "prediction {} succeeded without output",
                self.id
            )));
        }

        let error = (status == JobStatus::Failed).then(|| self.error_message());
        let poll_url = match (self.urls, known_poll_url) {
            (Some(urls), _) => urls.get,
            (None, Some(url)) => url.to_string(),
            (None, None) => {
                return Err(ProviderError::ResponseInvalid(format!(
                    "prediction {} has no status URL",
                    self.id
                )))
            }
        };

        Ok(ProviderJob {
            id: self.id,
            status,
            poll_url,
            output_url,
            error,
        })
    }

    fn into_reply(self) -> Result<ProviderReply, ProviderError> {
        match self.job_status()? {
            JobStatus::Succeeded => match self.first_output() {
                Some(output_url) => Ok(ProviderReply::Ready { output_url }),
                None => Err(ProviderError::ResponseInvalid(format!(
                    "prediction {} succeeded without output",
                    self.id
                ))),
            },
            JobStatus::Failed => Ok(ProviderReply::Failed {
                message: self.error_message(),
            }),
            JobStatus::Pending | JobStatus::Processing => {
                Ok(ProviderReply::Pending(self.into_job(None)?))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Replicate client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_token: String,
}

impl ReplicateClient {
    pub fn new(api_token: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .context("Failed to build Replicate HTTP client")?,
            api_token,
        })
    }

    async fn read_success_body(response: reqwest::Response) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ReplicateErrorBody>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            warn!("Replicate returned {status}: {message}");
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ImageProvider for ReplicateClient {
    async fn create(&self, request: &PredictionRequest) -> Result<ProviderReply, ProviderError> {
        let response = self
            .client
            .post(REPLICATE_API_URL)
            .bearer_auth(&self.api_token)
            .header("Prefer", format!("wait={SYNC_WAIT_SECS}"))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let body = Self::read_success_body(response).await?;
        let reply = Prediction::parse(&body)?.into_reply()?;
        debug!("Replicate create answered: {reply:?}");
        Ok(reply)
    }

    async fn fetch(&self, job: &ProviderJob) -> Result<ProviderJob, ProviderError> {
        let response = self
            .client
            .get(&job.poll_url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let body = Self::read_success_body(response).await?;
        Prediction::parse(&body)?.into_job(Some(&job.poll_url))
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: format!("artifact download from {url} failed"),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str) -> Result<ProviderReply, ProviderError> {
        Prediction::parse(body)?.into_reply()
    }

    #[test]
    fn test_succeeded_with_string_output_is_ready() {
        let body = r#"{"id":"p1","status":"succeeded","output":"https://cdn/out.png",
            "urls":{"get":"https://api/p1"}}"#;
        assert_eq!(
            reply(body).unwrap(),
            ProviderReply::Ready {
                output_url: "https://cdn/out.png".to_string()
            }
        );
    }

    #[test]
    fn test_succeeded_with_array_output_uses_first() {
        let body = r#"{"id":"p1","status":"succeeded","output":["https://cdn/a.png","https://cdn/b.png"]}"#;
        assert_eq!(
            reply(body).unwrap(),
            ProviderReply::Ready {
                output_url: "https://cdn/a.png".to_string()
            }
        );
    }

    #[test]
    fn test_starting_is_pending_with_poll_url() {
        let body = r#"{"id":"p2","status":"starting","output":null,"urls":{"get":"https://api/p2"}}"#;
        match reply(body).unwrap() {
            ProviderReply::Pending(job) => {
                assert_eq!(job.id, "p2");
                assert_eq!(job.status, JobStatus::Pending);
                assert_eq!(job.poll_url, "https://api/p2");
            }
            other => panic!("expected pending, got {other:?}"),
        }
    }

    #[test]
    fn test_processing_without_status_url_is_invalid() {
        let body = r#"{"id":"p3","status":"processing"}"#;
        assert!(matches!(
            reply(body),
            Err(ProviderError::ResponseInvalid(_))
        ));
    }

    #[test]
    fn test_failed_carries_provider_message() {
        let body = r#"{"id":"p4","status":"failed","error":"NSFW content detected"}"#;
        assert_eq!(
            reply(body).unwrap(),
            ProviderReply::Failed {
                message: "NSFW content detected".to_string()
            }
        );
    }

    #[test]
    fn test_canceled_counts_as_failed() {
        let body = r#"{"id":"p5","status":"canceled","error":null}"#;
        assert!(matches!(reply(body).unwrap(), ProviderReply::Failed { .. }));
    }

    #[test]
    fn test_succeeded_without_output_is_invalid() {
        let body = r#"{"id":"p6","status":"succeeded","output":[]}"#;
        assert!(matches!(
            reply(body),
            Err(ProviderError::ResponseInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_status_is_invalid() {
        let body = r#"{"id":"p7","status":"queued"}"#;
        assert!(matches!(
            reply(body),
            Err(ProviderError::ResponseInvalid(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_invalid() {
        assert!(matches!(
            reply("<html>bad gateway</html>"),
            Err(ProviderError::ResponseInvalid(_))
        ));
    }

    #[test]
    fn test_poll_response_keeps_known_status_url() {
        let job = Prediction::parse(r#"{"id":"p8","status":"processing"}"#)
            .unwrap()
            .into_job(Some("https://api/p8"))
            .unwrap();
        assert_eq!(job.poll_url, "https://api/p8");
        assert_eq!(job.status, JobStatus::Processing);
        assert!(!job.status.is_terminal());
    }
}
