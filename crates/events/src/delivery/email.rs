//! Staff email notification via SMTP.
//!
//! [`EmailChannel`] sends a plain-text message for each
//! [`CompletionNotice`] to a fixed staff address using the `lettre` async
//! SMTP transport. If `SMTP_HOST` is not set, [`EmailConfig::from_env`]
//! returns `None` and the channel should not be registered.

use async_trait::async_trait;
use lectern_core::channels::CHANNEL_EMAIL;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::dispatcher::{ChannelError, NotificationChannel};
use crate::notice::CompletionNotice;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "noreply@lectern.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                  |
    /// |-----------------|----------|--------------------------|
    /// | `SMTP_HOST`     | yes      |                          |
    /// | `SMTP_PORT`     | no       | `587`                    |
    /// | `SMTP_FROM`     | no       | `noreply@lectern.local`  |
    /// | `SMTP_USER`     | no       |                          |
    /// | `SMTP_PASSWORD` | no       |                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailChannel
// ---------------------------------------------------------------------------

pub struct EmailChannel {
    config: EmailConfig,
    to_address: String,
}

impl EmailChannel {
    pub fn new(config: EmailConfig, to_address: impl Into<String>) -> Self {
        Self {
            config,
            to_address: to_address.into(),
        }
    }

    fn build_message(&self, notice: &CompletionNotice) -> Result<Message, EmailError> {
        let subject = format!("[Lectern] {}", notice.summary());
        let body = format!(
            "Phase 1 completed.\n\nUser: {}\nCourse: {} (id {})\nCompleted at: {}\n",
            notice.user_id,
            notice.course_title,
            notice.course_id,
            notice.completed_at.to_rfc3339(),
        );

        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.to_address.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    pub async fn deliver(&self, notice: &CompletionNotice) -> Result<(), EmailError> {
        let email = self.build_message(notice)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(
            to = %self.to_address,
            user_id = notice.user_id,
            course_id = notice.course_id,
            "Completion email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        CHANNEL_EMAIL
    }

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError> {
        Ok(self.deliver(notice).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
