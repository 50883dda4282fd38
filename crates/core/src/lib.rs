//! Lectern domain core.
//!
//! Pure, I/O-free building blocks shared by the storage, notification and
//! API crates:
//!
//! - [`progression`]: the canonical lesson unlock policy.
//! - [`completion`]: the "every lesson completed" predicate.
//! - [`quiz`]: score validation and pass/fail rules.
//! - [`phase`]: course phase status values.
//! - [`channels`]: well-known notification channel names.

pub mod channels;
pub mod completion;
pub mod error;
pub mod phase;
pub mod progression;
pub mod quiz;
pub mod types;
