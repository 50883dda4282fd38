//! Lectern API server library.
//!
//! Exposes the progression engine, configuration, state, error handling and
//! routes so integration tests and the binary entrypoint share them.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
