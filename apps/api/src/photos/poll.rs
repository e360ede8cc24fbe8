//! Bounded, cancellation-aware polling of a pending provider job.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::photos::provider::{ImageProvider, JobStatus, ProviderError, ProviderJob};

/// Fixed-interval polling budget. The whole loop, status requests included,
/// finishes within `interval * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Terminal result of a poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Succeeded { output_url: String },
    Failed { message: String },
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Polls `job` until the provider reports a terminal status, the budget
/// runs out, or `cancel` fires.
///
/// Each attempt issues one status request and then waits one interval. A
/// status request still in flight when the budget expires is abandoned.
/// Transport or HTTP errors on a status request end the loop immediately.
pub async fn poll_until_terminal(
    provider: &dyn ImageProvider,
    mut job: ProviderJob,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<PollOutcome, ProviderError> {
    let deadline = Instant::now() + policy.budget();

    for attempt in 1..=policy.max_attempts {
        if Instant::now() >= deadline {
            return Ok(PollOutcome::TimedOut {
                attempts: attempt - 1,
            });
        }

        job = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            polled = provider.fetch(&job) => polled?,
            _ = sleep_until(deadline) => return Ok(PollOutcome::TimedOut { attempts: attempt }),
        };

        debug!(
            job_id = %job.id,
            attempt,
            max_attempts = policy.max_attempts,
            status = ?job.status,
            "Polled provider job"
        );

        if job.status.is_terminal() {
            return terminal_outcome(job);
        }

        if attempt < policy.max_attempts {
            let wake = (Instant::now() + policy.interval).min(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = sleep_until(wake) => {}
            }
        }
    }

    Ok(PollOutcome::TimedOut {
        attempts: policy.max_attempts,
    })
}

fn terminal_outcome(mut job: ProviderJob) -> Result<PollOutcome, ProviderError> {
    match job.status {
        JobStatus::Succeeded => {
            let output_url = job.output_url.take().ok_or_else(|| {
                ProviderError::ResponseInvalid(format!("job {} succeeded without output", job.id))
            })?;
            Ok(PollOutcome::Succeeded { output_url })
        }
        _ => {
            let message = job
                .error
                .take()
                .unwrap_or_else(|| "Unknown error".to_string());
            Ok(PollOutcome::Failed { message })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::photos::testing::{job, processing_then, FakeProvider, OUTPUT_URL};

    const POLICY: PollPolicy = PollPolicy {
        interval: Duration::from_secs(2),
        max_attempts: 60,
    };

    #[tokio::test(start_paused = true)]
    async fn test_success_on_last_allowed_attempt() {
        let provider = FakeProvider::pending(processing_then(59, JobStatus::Succeeded));
        let cancel = CancellationToken::new();

        let outcome = poll_until_terminal(&provider, job(JobStatus::Pending), POLICY, &cancel)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Succeeded {
                output_url: OUTPUT_URL.to_string()
            }
        );
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_budget() {
        let provider = FakeProvider::pending(vec![]);
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let outcome = poll_until_terminal(&provider, job(JobStatus::Pending), POLICY, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 60 });
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 60);
        assert!(started.elapsed() <= POLICY.budget());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_status_requests_stay_within_budget() {
        let provider = FakeProvider::pending(vec![]).with_slow_fetch(Duration::from_secs(10));
        let started = Instant::now();

        let outcome = poll_until_terminal(
            &provider,
            job(JobStatus::Pending),
            POLICY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, PollOutcome::TimedOut { attempts } if attempts < 60));
        assert!(started.elapsed() <= POLICY.budget());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_status_request_is_abandoned_at_deadline() {
        let provider = FakeProvider::pending(vec![]).with_slow_fetch(Duration::from_secs(600));
        let started = Instant::now();

        let outcome = poll_until_terminal(
            &provider,
            job(JobStatus::Pending),
            POLICY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 1 });
        assert!(started.elapsed() <= POLICY.budget());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enhancement_budget_is_thirty_attempts() {
        let provider = FakeProvider::pending(vec![]);
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        };

        let outcome = poll_until_terminal(
            &provider,
            job(JobStatus::Pending),
            policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 30 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_carries_provider_message() {
        let provider = FakeProvider::pending(processing_then(3, JobStatus::Failed));

        let outcome = poll_until_terminal(
            &provider,
            job(JobStatus::Pending),
            POLICY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                message: "model crashed".to_string()
            }
        );
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling() {
        let provider = FakeProvider::pending(vec![]);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let outcome = poll_until_terminal(&provider, job(JobStatus::Pending), POLICY, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert!(provider.fetch_calls.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_token_never_polls() {
        let provider = FakeProvider::pending(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = poll_until_terminal(&provider, job(JobStatus::Pending), POLICY, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 0);
    }
}
