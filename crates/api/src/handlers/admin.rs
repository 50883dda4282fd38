//! Administrative handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use lectern_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /admin/users/{user_id}/courses/{course_id}/reset
// ---------------------------------------------------------------------------

/// Wipe a learner's progress in a course and re-arm phase 1 completion.
pub async fn reset_course_progress(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let summary = state.engine.on_admin_reset(user_id, course_id).await?;
    Ok(Json(DataResponse { data: summary }))
}
