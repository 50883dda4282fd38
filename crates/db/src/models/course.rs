//! Catalog read models: courses, lessons and quizzes.
//!
//! Authoring happens elsewhere; the engine only reads these rows.

use lectern_core::progression::LessonRef;
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `lessons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lesson {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    /// 1-based position within the course, unique per course.
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lesson {
    /// The lesson's identity and position, as consumed by the unlock policy.
    pub fn lesson_ref(&self) -> LessonRef {
        LessonRef {
            id: self.id,
            order: self.sort_order,
        }
    }
}

/// A row from the `quizzes` table. A lesson has at most one quiz.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: DbId,
    pub lesson_id: DbId,
    pub passing_score: i32,
    pub max_attempts: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
