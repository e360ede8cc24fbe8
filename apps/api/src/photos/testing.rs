//! In-memory provider and artifact store used by the photo pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::photos::artifacts::{ArtifactStore, StoreError};
use crate::photos::provider::{
    ImageProvider, JobStatus, PredictionRequest, ProviderError, ProviderJob, ProviderReply,
};

pub const POLL_URL: &str = "https://provider.test/predictions/job-1";
pub const OUTPUT_URL: &str = "https://provider.test/delivery/out.png";

pub fn job(status: JobStatus) -> ProviderJob {
    ProviderJob {
        id: "job-1".to_string(),
        status,
        poll_url: POLL_URL.to_string(),
        output_url: (status == JobStatus::Succeeded).then(|| OUTPUT_URL.to_string()),
        error: (status == JobStatus::Failed).then(|| "model crashed".to_string()),
    }
}

/// `n` processing responses followed by `last`.
pub fn processing_then(n: usize, last: JobStatus) -> Vec<ProviderJob> {
    let mut script = vec![job(JobStatus::Processing); n];
    script.push(job(last));
    script
}

/// Provider whose answers are fixed up front. Once the poll script is
/// exhausted every poll reports `processing`.
pub struct FakeProvider {
    create_reply: Option<ProviderReply>,
    reject_create_with: Option<u16>,
    polls: Mutex<VecDeque<ProviderJob>>,
    fail_download: bool,
    fetch_delay: Option<Duration>,
    pub requests: Mutex<Vec<PredictionRequest>>,
    pub fetch_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl FakeProvider {
    fn new(create_reply: Option<ProviderReply>) -> Self {
        Self {
            create_reply,
            reject_create_with: None,
            polls: Mutex::new(VecDeque::new()),
            fail_download: false,
            fetch_delay: None,
            requests: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn ready() -> Self {
        Self::new(Some(ProviderReply::Ready {
            output_url: OUTPUT_URL.to_string(),
        }))
    }

    pub fn pending(script: Vec<ProviderJob>) -> Self {
        let provider = Self::new(Some(ProviderReply::Pending(job(JobStatus::Pending))));
        *provider.polls.lock().unwrap() = script.into();
        provider
    }

    pub fn rejecting(status: u16) -> Self {
        let mut provider = Self::new(None);
        provider.reject_create_with = Some(status);
        provider
    }

    pub fn with_failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    /// Every status request takes `delay` before answering.
    pub fn with_slow_fetch(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls()
            + self.fetch_calls.load(Ordering::SeqCst)
            + self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    async fn create(&self, request: &PredictionRequest) -> Result<ProviderReply, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(status) = self.reject_create_with {
            return Err(ProviderError::Rejected {
                status,
                message: "Invalid version or not permitted".to_string(),
            });
        }
        Ok(self
            .create_reply
            .clone()
            .unwrap_or(ProviderReply::Pending(job(JobStatus::Pending))))
    }

    async fn fetch(&self, _job: &ProviderJob) -> Result<ProviderJob, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| job(JobStatus::Processing)))
    }

    async fn download(&self, _url: &str) -> Result<Bytes, ProviderError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_download {
            return Err(ProviderError::Unreachable("connection reset".to_string()));
        }
        Ok(Bytes::from_static(b"\x89PNG fake image"))
    }
}

/// Artifact store that records uploads in memory.
#[derive(Default)]
pub struct FakeStore {
    fail_uploads: bool,
    fail_signing: bool,
    fail_deletes: bool,
    pub uploads: Mutex<Vec<(String, usize, String)>>,
    pub signed: Mutex<Vec<(String, Duration)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_signing() -> Self {
        Self {
            fail_signing: true,
            ..Self::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for FakeStore {
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError> {
        if self.fail_uploads {
            return Err(StoreError::Upload {
                path: path.to_string(),
                message: "bucket unavailable".to_string(),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len(), content_type.to_string()));
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StoreError> {
        if self.fail_signing {
            return Err(StoreError::Signing {
                path: path.to_string(),
                message: "signing key rotated".to_string(),
            });
        }
        self.signed.lock().unwrap().push((path.to_string(), ttl));
        Ok(format!("https://store.test/{path}?expires={}", ttl.as_secs()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Delete {
                path: path.to_string(),
                message: "access denied".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}
