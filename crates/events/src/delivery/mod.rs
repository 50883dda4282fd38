//! Reference [`NotificationChannel`](crate::NotificationChannel)
//! implementations.
//!
//! Email and webhook push the notice outside the process; the bus channel
//! republishes it as a [`PlatformEvent`](crate::PlatformEvent) for in-app
//! consumers; the log channel writes one structured line.

pub mod bus;
pub mod email;
pub mod log;
pub mod webhook;
