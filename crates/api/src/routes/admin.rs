//! Admin routes, mounted at `/admin` by `api_routes()`.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// ```text
/// POST   /users/{user_id}/courses/{course_id}/reset     -> reset_course_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/courses/{course_id}/reset",
        post(admin::reset_course_progress),
    )
}
