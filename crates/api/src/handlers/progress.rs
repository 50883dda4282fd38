//! Handlers for learner progress.
//!
//! Learner events (`access`, `video-ended`, `quiz-attempts`) are idempotent
//! and safe to resend. A `503 STORE_UNAVAILABLE` response means nothing was
//! recorded and the client should retry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lectern_core::types::DbId;

use crate::engine::QuizSubmission;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /users/{user_id}/courses/{course_id}/lessons
// ---------------------------------------------------------------------------

pub async fn list_lesson_states(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let lessons = state.engine.lesson_states(user_id, course_id).await?;
    Ok(Json(DataResponse { data: lessons }))
}

// ---------------------------------------------------------------------------
// GET /users/{user_id}/courses/{course_id}/phase
// ---------------------------------------------------------------------------

pub async fn get_phase_progress(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let phase = state.engine.phase_progress(user_id, course_id).await?;
    Ok(Json(DataResponse { data: phase }))
}

// ---------------------------------------------------------------------------
// POST /users/{user_id}/lessons/{lesson_id}/access
// ---------------------------------------------------------------------------

/// Record that the learner opened a lesson. `403` when the lesson is locked.
pub async fn record_access(
    State(state): State<AppState>,
    Path((user_id, lesson_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let progress = state.engine.record_access(user_id, lesson_id).await?;
    Ok(Json(DataResponse { data: progress }))
}

// ---------------------------------------------------------------------------
// POST /users/{user_id}/lessons/{lesson_id}/video-ended
// ---------------------------------------------------------------------------

pub async fn video_ended(
    State(state): State<AppState>,
    Path((user_id, lesson_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let update = state.engine.on_video_ended(user_id, lesson_id).await?;
    Ok(Json(DataResponse { data: update }))
}

// ---------------------------------------------------------------------------
// POST /users/{user_id}/lessons/{lesson_id}/quiz-attempts
// ---------------------------------------------------------------------------

/// Submit a quiz attempt. Every attempt is logged; `201` either way.
pub async fn submit_quiz_attempt(
    State(state): State<AppState>,
    Path((user_id, lesson_id)): Path<(DbId, DbId)>,
    Json(input): Json<QuizSubmission>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .engine
        .on_quiz_submitted(user_id, lesson_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

// ---------------------------------------------------------------------------
// GET /users/{user_id}/lessons/{lesson_id}/quiz-attempts
// ---------------------------------------------------------------------------

pub async fn list_quiz_attempts(
    State(state): State<AppState>,
    Path((user_id, lesson_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let log = state.engine.quiz_attempts(user_id, lesson_id).await?;
    Ok(Json(DataResponse { data: log }))
}
