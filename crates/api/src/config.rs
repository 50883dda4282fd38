use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CHANNEL_TIMEOUT_SECS must be greater than zero")]
    ZeroChannelTimeout,

    #[error(
        "CHANNEL_TIMEOUT_SECS ({channel_secs}) must be below REQUEST_TIMEOUT_SECS ({request_secs})"
    )]
    ChannelTimeoutExceedsRequest { channel_secs: u64, request_secs: u64 },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("PORT", 3000),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", 30),
        }
    }
}

/// Which completion notification channels are enabled.
///
/// The log and in-app bus channels are always on. Email additionally needs
/// SMTP settings (see `lectern_events::EmailConfig`).
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Staff address that receives completion emails.
    pub staff_email: Option<String>,
    /// Endpoint that receives completion webhooks.
    pub webhook_url: Option<String>,
    /// Per-channel send timeout in seconds (default: `15`).
    pub channel_timeout_secs: u64,
}

impl NotificationConfig {
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `STAFF_NOTIFY_EMAIL`     | unset   |
    /// | `COMPLETION_WEBHOOK_URL` | unset   |
    /// | `CHANNEL_TIMEOUT_SECS`   | `15`    |
    pub fn from_env() -> Self {
        Self {
            staff_email: non_empty_env("STAFF_NOTIFY_EMAIL"),
            webhook_url: non_empty_env("COMPLETION_WEBHOOK_URL"),
            channel_timeout_secs: parse_env("CHANNEL_TIMEOUT_SECS", 15),
        }
    }

    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_secs)
    }

    /// A completion response carries the dispatch report, so every channel
    /// must settle before the HTTP request timeout fires.
    pub fn validate(&self, server: &ServerConfig) -> Result<(), ConfigError> {
        if self.channel_timeout_secs == 0 {
            return Err(ConfigError::ZeroChannelTimeout);
        }
        if self.channel_timeout_secs >= server.request_timeout_secs {
            return Err(ConfigError::ChannelTimeoutExceedsRequest {
                channel_secs: self.channel_timeout_secs,
                request_secs: server.request_timeout_secs,
            });
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            staff_email: None,
            webhook_url: None,
            channel_timeout_secs: 15,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `key` if set, falling back to `default` (with a warning) when the
/// value does not parse.
fn parse_env<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
