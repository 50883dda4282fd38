//! Well-known notification channel name constants.
//!
//! Used as channel identifiers in dispatch reports and log lines.

/// Staff notification delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// Notification delivered to an external HTTP endpoint.
pub const CHANNEL_WEBHOOK: &str = "webhook";

/// In-app notification published on the in-process event bus.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Structured log line only.
pub const CHANNEL_LOG: &str = "log";
