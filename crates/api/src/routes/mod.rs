pub mod admin;
pub mod health;
pub mod progress;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /users/{user_id}/courses/{course_id}/lessons         lesson states
/// /users/{user_id}/courses/{course_id}/phase           phase progress
/// /users/{user_id}/lessons/{lesson_id}/access          record access (POST)
/// /users/{user_id}/lessons/{lesson_id}/video-ended     video ended (POST)
/// /users/{user_id}/lessons/{lesson_id}/quiz-attempts   list, submit
///
/// /admin/users/{user_id}/courses/{course_id}/reset     reset progress (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", progress::router())
        .nest("/admin", admin::router())
}
