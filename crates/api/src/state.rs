use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::ProgressionEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProgressionEngine>,
    pub config: Arc<ServerConfig>,
}
