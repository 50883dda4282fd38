//! Learner progress routes, mounted at `/users` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

/// ```text
/// GET    /{user_id}/courses/{course_id}/lessons         -> list_lesson_states
/// GET    /{user_id}/courses/{course_id}/phase           -> get_phase_progress
/// POST   /{user_id}/lessons/{lesson_id}/access          -> record_access
/// POST   /{user_id}/lessons/{lesson_id}/video-ended     -> video_ended
/// GET    /{user_id}/lessons/{lesson_id}/quiz-attempts   -> list_quiz_attempts
/// POST   /{user_id}/lessons/{lesson_id}/quiz-attempts   -> submit_quiz_attempt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{user_id}/courses/{course_id}/lessons",
            get(progress::list_lesson_states),
        )
        .route(
            "/{user_id}/courses/{course_id}/phase",
            get(progress::get_phase_progress),
        )
        .route(
            "/{user_id}/lessons/{lesson_id}/access",
            post(progress::record_access),
        )
        .route(
            "/{user_id}/lessons/{lesson_id}/video-ended",
            post(progress::video_ended),
        )
        .route(
            "/{user_id}/lessons/{lesson_id}/quiz-attempts",
            get(progress::list_quiz_attempts).post(progress::submit_quiz_attempt),
        )
}
