//! Repository for the append-only `quiz_attempts` table.

use lectern_core::types::DbId;
use sqlx::PgPool;

use crate::models::quiz_attempt::{NewQuizAttempt, QuizAttempt};

/// Column list for `quiz_attempts` queries.
const COLUMNS: &str = "id, user_id, lesson_id, quiz_id, score, passed, answers, created_at";

/// Appends and lists quiz attempts. Rows are never updated or deleted.
pub struct QuizAttemptRepo;

impl QuizAttemptRepo {
    /// Append an attempt, returning the stored row.
    pub async fn create(pool: &PgPool, input: &NewQuizAttempt) -> Result<QuizAttempt, sqlx::Error> {
        let query = format!(
            "INSERT INTO quiz_attempts (user_id, lesson_id, quiz_id, score, passed, answers) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuizAttempt>(&query)
            .bind(input.user_id)
            .bind(input.lesson_id)
            .bind(input.quiz_id)
            .bind(input.score)
            .bind(input.passed)
            .bind(&input.answers)
            .fetch_one(pool)
            .await
    }

    /// List a learner's attempts for a lesson, oldest first.
    pub async fn list_for_lesson(
        pool: &PgPool,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Vec<QuizAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quiz_attempts \
             WHERE user_id = $1 AND lesson_id = $2 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, QuizAttempt>(&query)
            .bind(user_id)
            .bind(lesson_id)
            .fetch_all(pool)
            .await
    }
}
