//! Repository for the `phase_progress` table.
//!
//! [`PhaseProgressRepo::claim_phase1`] is the completion gate: a single
//! conditional `UPDATE ... WHERE phase1_completed_at IS NULL RETURNING`.
//! PostgreSQL row locking guarantees that of any number of concurrent
//! callers exactly one sees a returned row; the rest see none.

use lectern_core::phase::{
    INITIAL_PHASE, PHASE_AFTER_PHASE1, PHASE_STATUS_ENROLLED, PHASE_STATUS_PHASE1_COMPLETED,
};
use lectern_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::phase_progress::PhaseProgress;

/// Column list for `phase_progress` queries.
const COLUMNS: &str = "\
    id, user_id, course_id, phase1_completed_at, current_phase, status, \
    created_at, updated_at";

/// Provides the enrollment upsert, the completion claim and reads.
pub struct PhaseProgressRepo;

impl PhaseProgressRepo {
    /// Find the phase row for a pair.
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<PhaseProgress>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM phase_progress WHERE user_id = $1 AND course_id = $2");
        sqlx::query_as::<_, PhaseProgress>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the pair's row in `enrolled` state if it does not exist.
    /// An existing row is left untouched.
    pub async fn ensure_enrolled(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO phase_progress (user_id, course_id, current_phase, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(INITIAL_PHASE)
        .bind(PHASE_STATUS_ENROLLED)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Atomically claim phase 1 completion.
    ///
    /// Returns `Some(completed_at)` to the single winner and `None` when the
    /// pair was already claimed or has no row.
    pub async fn claim_phase1(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE phase_progress \
             SET phase1_completed_at = NOW(), \
                 current_phase = $3, \
                 status = $4, \
                 updated_at = NOW() \
             WHERE user_id = $1 AND course_id = $2 \
               AND phase1_completed_at IS NULL \
             RETURNING phase1_completed_at",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(PHASE_AFTER_PHASE1)
        .bind(PHASE_STATUS_PHASE1_COMPLETED)
        .fetch_optional(pool)
        .await
    }
}
