//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookChannel`] POSTs a JSON envelope of the [`CompletionNotice`] to a
//! configured URL. A failed attempt is retried after each delay in the
//! schedule (1 s, 2 s, 4 s by default), so at most four requests are made.
//!
//! The dispatcher cuts every channel off after its per-channel timeout.
//! [`WebhookChannel::with_budget`] sizes the schedule so every attempt
//! fits inside that timeout.

use std::time::Duration;

use async_trait::async_trait;
use lectern_core::channels::CHANNEL_WEBHOOK;

use crate::dispatcher::{ChannelError, NotificationChannel};
use crate::notice::{CompletionNotice, EVENT_PHASE1_COMPLETED};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Upper bound on a single delivery attempt.
const MAX_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lower bound on a single delivery attempt. Retries that cannot get this
/// much time are dropped from a budgeted schedule.
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Slack kept between a budgeted schedule and the budget itself.
const BUDGET_MARGIN: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Network, DNS or timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookChannel
// ---------------------------------------------------------------------------

pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
    attempt_timeout: Duration,
}

impl WebhookChannel {
    /// Default schedule with the full per-attempt timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        Self::build(url.into(), default_delays(), MAX_ATTEMPT_TIMEOUT)
    }

    /// Fit the whole schedule, requests and backoff, inside `budget`.
    ///
    /// Trailing retries are dropped until each attempt can get at least
    /// [`MIN_ATTEMPT_TIMEOUT`]; what is left after backoff is split evenly
    /// across the attempts.
    pub fn with_budget(url: impl Into<String>, budget: Duration) -> Result<Self, WebhookError> {
        let budget = budget.saturating_sub(BUDGET_MARGIN);
        let mut delays = default_delays();
        while !delays.is_empty()
            && total_backoff(&delays) + MIN_ATTEMPT_TIMEOUT * attempts(&delays) > budget
        {
            delays.pop();
        }

        let attempt_timeout = (budget.saturating_sub(total_backoff(&delays)) / attempts(&delays))
            .clamp(MIN_ATTEMPT_TIMEOUT, MAX_ATTEMPT_TIMEOUT);
        Self::build(url.into(), delays, attempt_timeout)
    }

    fn build(
        url: String,
        retry_delays: Vec<Duration>,
        attempt_timeout: Duration,
    ) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .build()?;
        Ok(Self {
            client,
            url,
            retry_delays,
            attempt_timeout,
        })
    }

    /// Replace the backoff schedule. An empty schedule means one attempt.
    /// The per-attempt timeout is left as is.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Worst-case time for the whole schedule: every attempt hitting its
    /// timeout plus every backoff.
    pub fn schedule_duration(&self) -> Duration {
        self.attempt_timeout * attempts(&self.retry_delays) + total_backoff(&self.retry_delays)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver with retry. Returns the last error once the schedule is
    /// exhausted.
    pub async fn deliver(&self, notice: &CompletionNotice) -> Result<(), WebhookError> {
        let payload = envelope(notice);

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(&payload).await.inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "Webhook delivery failed after all retries");
        })
    }

    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

fn default_delays() -> Vec<Duration> {
    RETRY_DELAYS_SECS
        .iter()
        .map(|s| Duration::from_secs(*s))
        .collect()
}

fn total_backoff(delays: &[Duration]) -> Duration {
    delays.iter().sum()
}

fn attempts(delays: &[Duration]) -> u32 {
    delays.len() as u32 + 1
}

/// The JSON body posted to the webhook.
fn envelope(notice: &CompletionNotice) -> serde_json::Value {
    serde_json::json!({
        "event_type": EVENT_PHASE1_COMPLETED,
        "user_id": notice.user_id,
        "course_id": notice.course_id,
        "course_title": notice.course_title,
        "completed_at": notice.completed_at,
    })
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        CHANNEL_WEBHOOK
    }

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError> {
        Ok(self.deliver(notice).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
