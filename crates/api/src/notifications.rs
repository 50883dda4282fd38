//! Assembles the completion [`NotificationDispatcher`] from configuration.

use std::sync::Arc;

use lectern_events::{
    BusChannel, EmailChannel, EmailConfig, EventBus, LogChannel, NotificationDispatcher,
    WebhookChannel,
};

use crate::config::NotificationConfig;

/// Register the log and bus channels unconditionally, then email when both
/// a staff address and SMTP settings are present, then the webhook when a
/// URL is configured. The webhook's retry schedule is sized to the
/// per-channel timeout. A webhook client that fails to build is logged and
/// skipped.
pub fn build_dispatcher(
    config: &NotificationConfig,
    email: Option<EmailConfig>,
    bus: Arc<EventBus>,
) -> NotificationDispatcher {
    let mut dispatcher = NotificationDispatcher::new(config.channel_timeout())
        .with_channel(Arc::new(LogChannel))
        .with_channel(Arc::new(BusChannel::new(bus)));

    match (&config.staff_email, email) {
        (Some(to), Some(smtp)) => {
            dispatcher.add_channel(Arc::new(EmailChannel::new(smtp, to.clone())));
        }
        (Some(_), None) => {
            tracing::warn!("STAFF_NOTIFY_EMAIL set without SMTP_HOST, email channel disabled");
        }
        _ => {}
    }

    if let Some(url) = &config.webhook_url {
        match WebhookChannel::with_budget(url.clone(), config.channel_timeout()) {
            Ok(channel) => dispatcher.add_channel(Arc::new(channel)),
            Err(e) => tracing::error!(error = %e, "Failed to build webhook channel"),
        }
    }

    tracing::info!(channels = ?dispatcher.channel_names(), "Notification channels configured");
    dispatcher
}

#[cfg(test)]
mod tests {
    use lectern_core::channels::{CHANNEL_EMAIL, CHANNEL_IN_APP, CHANNEL_LOG, CHANNEL_WEBHOOK};

    use super::*;

    fn smtp() -> EmailConfig {
        EmailConfig {
            smtp_host: "localhost".into(),
            smtp_port: 587,
            from_address: "noreply@lectern.local".into(),
            smtp_user: None,
            smtp_password: None,
        }
    }

    #[test]
    fn default_config_has_log_and_bus_only() {
        let dispatcher =
            build_dispatcher(&NotificationConfig::default(), None, Arc::new(EventBus::default()));
        assert_eq!(dispatcher.channel_names(), vec![CHANNEL_LOG, CHANNEL_IN_APP]);
    }

    #[test]
    fn email_needs_both_address_and_smtp() {
        let config = NotificationConfig {
            staff_email: Some("staff@lectern.local".into()),
            ..NotificationConfig::default()
        };
        let without_smtp = build_dispatcher(&config, None, Arc::new(EventBus::default()));
        assert!(!without_smtp.channel_names().contains(&CHANNEL_EMAIL));

        let with_smtp = build_dispatcher(&config, Some(smtp()), Arc::new(EventBus::default()));
        assert!(with_smtp.channel_names().contains(&CHANNEL_EMAIL));
    }

    #[test]
    fn webhook_registered_when_url_set() {
        let config = NotificationConfig {
            webhook_url: Some("http://localhost:9000/hooks/completion".into()),
            ..NotificationConfig::default()
        };
        let dispatcher = build_dispatcher(&config, None, Arc::new(EventBus::default()));
        assert_eq!(
            dispatcher.channel_names(),
            vec![CHANNEL_LOG, CHANNEL_IN_APP, CHANNEL_WEBHOOK]
        );
    }
}
