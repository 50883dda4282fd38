//! Quiz attempt log model and DTOs.

use lectern_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the append-only `quiz_attempts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: DbId,
    pub user_id: DbId,
    pub lesson_id: DbId,
    pub quiz_id: DbId,
    pub score: i32,
    pub passed: bool,
    pub answers: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for appending a quiz attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuizAttempt {
    pub user_id: DbId,
    pub lesson_id: DbId,
    pub quiz_id: DbId,
    pub score: i32,
    pub passed: bool,
    pub answers: serde_json::Value,
}
