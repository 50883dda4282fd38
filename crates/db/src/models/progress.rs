//! Per-lesson learner progress model.

use lectern_core::progression::LessonProgress;
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `progress` table, unique on `(user_id, lesson_id)`.
///
/// Booleans only ever move from `false` to `true` and each `*_at` timestamp
/// is written once, by the first event that set its flag. Only an
/// administrative reset removes rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Progress {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub lesson_id: DbId,
    pub video_watched: bool,
    pub video_watched_at: Option<Timestamp>,
    pub quiz_completed: bool,
    pub quiz_completed_at: Option<Timestamp>,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub last_accessed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Progress {
    /// The completion flags consumed by the unlock policy.
    pub fn flags(&self) -> LessonProgress {
        LessonProgress {
            video_watched: self.video_watched,
            quiz_completed: self.quiz_completed,
            completed: self.completed,
        }
    }
}
