//! Lectern completion notifications.
//!
//! - [`CompletionNotice`]: the payload sent once per (user, course) when
//!   phase 1 is claimed.
//! - [`NotificationDispatcher`]: settle-all fan-out of a notice to every
//!   registered [`NotificationChannel`], each under its own timeout.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, used for in-app consumers.
//! - [`delivery`]: the reference channels (email, webhook, bus, log).

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod notice;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::bus::BusChannel;
pub use delivery::email::{EmailChannel, EmailConfig};
pub use delivery::log::LogChannel;
pub use delivery::webhook::WebhookChannel;
pub use dispatcher::{
    ChannelError, ChannelOutcome, ChannelReport, DispatchReport, NotificationChannel,
    NotificationDispatcher,
};
pub use notice::CompletionNotice;
