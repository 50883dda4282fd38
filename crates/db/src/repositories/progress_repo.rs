//! Repository for the `progress` table.
//!
//! Every write is an `INSERT ... ON CONFLICT (user_id, lesson_id) DO UPDATE`
//! so a redelivered event lands on the same row. Flags are OR-ed and
//! timestamps are `COALESCE`d with the stored value, which makes the first
//! write win and keeps repeated events from moving anything backwards.

use std::collections::HashSet;

use lectern_core::phase::{INITIAL_PHASE, PHASE_STATUS_ENROLLED};
use lectern_core::types::DbId;
use sqlx::PgPool;

use crate::models::progress::Progress;

/// Column list for `progress` queries.
const COLUMNS: &str = "\
    id, user_id, course_id, lesson_id, \
    video_watched, video_watched_at, \
    quiz_completed, quiz_completed_at, \
    completed, completed_at, \
    last_accessed_at, created_at, updated_at";

/// Provides idempotent upserts and reads over learner progress.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Create the row if needed and bump `last_accessed_at`. No flag changes.
    pub async fn touch(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
        lesson_id: DbId,
    ) -> Result<Progress, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress (user_id, course_id, lesson_id, last_accessed_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 last_accessed_at = EXCLUDED.last_accessed_at, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .bind(course_id)
            .bind(lesson_id)
            .fetch_one(pool)
            .await
    }

    /// Record that the lesson video was watched to the end.
    ///
    /// With `auto_complete` (the lesson has no quiz) the lesson is also
    /// marked completed. Both timestamps are first-write-wins.
    pub async fn mark_video_watched(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
        lesson_id: DbId,
        auto_complete: bool,
    ) -> Result<Progress, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress \
                 (user_id, course_id, lesson_id, video_watched, video_watched_at, \
                  completed, completed_at, last_accessed_at) \
             VALUES ($1, $2, $3, TRUE, NOW(), $4::boolean, \
                     CASE WHEN $4::boolean THEN NOW() END, NOW()) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 video_watched = TRUE, \
                 video_watched_at = COALESCE(progress.video_watched_at, EXCLUDED.video_watched_at), \
                 completed = progress.completed OR EXCLUDED.completed, \
                 completed_at = COALESCE(progress.completed_at, EXCLUDED.completed_at), \
                 last_accessed_at = EXCLUDED.last_accessed_at, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .bind(course_id)
            .bind(lesson_id)
            .bind(auto_complete)
            .fetch_one(pool)
            .await
    }

    /// Record a passed quiz: sets quiz completion and lesson completion.
    ///
    /// Passing the quiz also implies the video was watched, which keeps the
    /// `completed => video_watched` check constraint satisfied.
    pub async fn mark_quiz_passed(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
        lesson_id: DbId,
    ) -> Result<Progress, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress \
                 (user_id, course_id, lesson_id, video_watched, video_watched_at, \
                  quiz_completed, quiz_completed_at, completed, completed_at, last_accessed_at) \
             VALUES ($1, $2, $3, TRUE, NOW(), TRUE, NOW(), TRUE, NOW(), NOW()) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 video_watched = TRUE, \
                 video_watched_at = COALESCE(progress.video_watched_at, EXCLUDED.video_watched_at), \
                 quiz_completed = TRUE, \
                 quiz_completed_at = COALESCE(progress.quiz_completed_at, EXCLUDED.quiz_completed_at), \
                 completed = TRUE, \
                 completed_at = COALESCE(progress.completed_at, EXCLUDED.completed_at), \
                 last_accessed_at = EXCLUDED.last_accessed_at, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .bind(course_id)
            .bind(lesson_id)
            .fetch_one(pool)
            .await
    }

    /// List a learner's progress rows for every lesson of a course.
    pub async fn list_for_course(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Vec<Progress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM progress \
             WHERE user_id = $1 AND course_id = $2 \
             ORDER BY lesson_id"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// Ids of the course's lessons the learner has completed.
    ///
    /// Joins through `lessons` so rows whose lesson moved to another course
    /// are not counted.
    pub async fn completed_lesson_ids(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT p.lesson_id FROM progress p \
             JOIN lessons l ON l.id = p.lesson_id \
             WHERE p.user_id = $1 AND l.course_id = $2 AND p.completed",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Administrative reset of a (user, course) pair.
    ///
    /// Deletes every progress row and re-arms `phase_progress` in a single
    /// transaction, so the pair never ends up cleared-but-still-claimed.
    /// Returns the number of progress rows removed.
    pub async fn reset_course(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM progress WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            "INSERT INTO phase_progress (user_id, course_id, current_phase, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, course_id) DO UPDATE SET \
                 phase1_completed_at = NULL, \
                 current_phase = EXCLUDED.current_phase, \
                 status = EXCLUDED.status, \
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(INITIAL_PHASE)
        .bind(PHASE_STATUS_ENROLLED)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted)
    }
}
