//! Settle-all notification fan-out.
//!
//! [`NotificationDispatcher::dispatch`] sends one [`CompletionNotice`] to
//! every registered channel concurrently. Each channel runs under its own
//! timeout and its failure, timeout or panic is recorded in the returned
//! [`DispatchReport`] without affecting any other channel. Dispatch itself
//! never fails.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;

use crate::delivery::email::EmailError;
use crate::delivery::webhook::WebhookError;
use crate::notice::CompletionNotice;

/// Per-channel timeout when none is configured.
pub const DEFAULT_CHANNEL_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single channel send.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error("Payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Channel failed: {0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// NotificationChannel
// ---------------------------------------------------------------------------

/// One independent delivery target for completion notices.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable name used in logs and dispatch reports.
    fn name(&self) -> &str;

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError>;
}

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

/// Result of sending to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Delivered,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub outcome: ChannelOutcome,
}

/// Per-channel outcomes of one dispatch, in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub channels: Vec<ChannelReport>,
}

impl DispatchReport {
    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| &r.outcome)
    }

    pub fn delivered_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|r| r.outcome == ChannelOutcome::Delivered)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.channels.len() - self.delivered_count()
    }

    pub fn all_delivered(&self) -> bool {
        self.failed_count() == 0
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    channel_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channel_timeout: Duration) -> Self {
        Self {
            channels: Vec::new(),
            channel_timeout,
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn add_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn channel_timeout(&self) -> Duration {
        self.channel_timeout
    }

    /// Send `notice` to every channel and wait for all of them to settle.
    pub async fn dispatch(&self, notice: &CompletionNotice) -> DispatchReport {
        let sends = self.channels.iter().map(|channel| async move {
            let name = channel.name().to_string();
            let send = AssertUnwindSafe(channel.send(notice)).catch_unwind();

            let outcome = match tokio::time::timeout(self.channel_timeout, send).await {
                Ok(Ok(Ok(()))) => ChannelOutcome::Delivered,
                Ok(Ok(Err(e))) => {
                    tracing::warn!(
                        channel = %name,
                        user_id = notice.user_id,
                        course_id = notice.course_id,
                        error = %e,
                        "Completion notification failed"
                    );
                    ChannelOutcome::Failed(e.to_string())
                }
                Ok(Err(_panic)) => {
                    tracing::error!(
                        channel = %name,
                        user_id = notice.user_id,
                        course_id = notice.course_id,
                        "Completion notification channel panicked"
                    );
                    ChannelOutcome::Failed("channel panicked".to_string())
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        channel = %name,
                        user_id = notice.user_id,
                        course_id = notice.course_id,
                        timeout_ms = self.channel_timeout.as_millis() as u64,
                        "Completion notification timed out"
                    );
                    ChannelOutcome::TimedOut
                }
            };

            ChannelReport {
                channel: name,
                outcome,
            }
        });

        let report = DispatchReport {
            channels: join_all(sends).await,
        };

        tracing::info!(
            user_id = notice.user_id,
            course_id = notice.course_id,
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            "Completion notice dispatched"
        );
        report
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    struct Counting {
        name: &'static str,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationChannel for Counting {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl NotificationChannel for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
            Err(ChannelError::Other("smtp refused".into()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl NotificationChannel for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    struct Panicking;

    #[async_trait]
    impl NotificationChannel for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
            panic!("boom");
        }
    }

    fn notice() -> CompletionNotice {
        CompletionNotice {
            user_id: 7,
            course_id: 3,
            course_title: "Foundations".into(),
            completed_at: Utc::now(),
        }
    }

    fn counting(name: &'static str) -> Arc<Counting> {
        Arc::new(Counting {
            name,
            sent: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn every_channel_receives_the_notice() {
        let a = counting("a");
        let b = counting("b");
        let dispatcher = NotificationDispatcher::default()
            .with_channel(a.clone())
            .with_channel(b.clone());

        let report = dispatcher.dispatch(&notice()).await;

        assert!(report.all_delivered());
        assert_eq!(report.delivered_count(), 2);
        assert_eq!(a.sent.load(Ordering::SeqCst), 1);
        assert_eq!(b.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_hanging_and_panicking_channels_are_isolated() {
        let ok = counting("ok");
        let dispatcher = NotificationDispatcher::new(Duration::from_millis(50))
            .with_channel(Arc::new(Failing))
            .with_channel(Arc::new(Hanging))
            .with_channel(Arc::new(Panicking))
            .with_channel(ok.clone());

        let report = dispatcher.dispatch(&notice()).await;

        assert_eq!(ok.sent.load(Ordering::SeqCst), 1);
        assert_eq!(report.outcome("ok"), Some(&ChannelOutcome::Delivered));
        assert_matches!(report.outcome("failing"), Some(ChannelOutcome::Failed(msg)) if msg.contains("smtp refused"));
        assert_eq!(report.outcome("hanging"), Some(&ChannelOutcome::TimedOut));
        assert_matches!(report.outcome("panicking"), Some(ChannelOutcome::Failed(_)));
        assert_eq!(report.failed_count(), 3);
    }

    #[tokio::test]
    async fn no_channels_yields_empty_report() {
        let report = NotificationDispatcher::default().dispatch(&notice()).await;
        assert!(report.channels.is_empty());
        assert!(report.all_delivered());
    }

    #[test]
    fn report_preserves_registration_order() {
        let dispatcher = NotificationDispatcher::default()
            .with_channel(counting("first"))
            .with_channel(Arc::new(Failing));
        assert_eq!(dispatcher.channel_names(), vec!["first", "failing"]);
    }

    #[test]
    fn outcome_serializes_tagged() {
        let json = serde_json::to_value(ChannelOutcome::Failed("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "detail": "x"}));
        let json = serde_json::to_value(ChannelOutcome::Delivered).unwrap();
        assert_eq!(json, serde_json::json!({"status": "delivered"}));
    }
}
