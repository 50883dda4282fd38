//! The storage seam of the progression engine.
//!
//! [`ProgressStore`] is everything the engine needs from durable storage:
//! catalog reads, idempotent progress upserts, the quiz attempt log and the
//! atomic phase-completion claim. The engine holds it as
//! `Arc<dyn ProgressStore>` and never caches progress itself.
//!
//! - [`PgProgressStore`] delegates to the PostgreSQL repositories.
//! - [`MemoryProgressStore`] keeps everything in process, for tests and for
//!   running the server without a database.

use std::collections::HashSet;

use async_trait::async_trait;
use lectern_core::types::{DbId, Timestamp};

use crate::models::course::{Course, Lesson, Quiz};
use crate::models::phase_progress::PhaseProgress;
use crate::models::progress::Progress;
use crate::models::quiz_attempt::{NewQuizAttempt, QuizAttempt};

pub mod memory;
pub mod postgres;

pub use memory::MemoryProgressStore;
pub use postgres::PgProgressStore;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store cannot serve requests right now.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    // --- Catalog ---

    async fn find_course(&self, course_id: DbId) -> Result<Option<Course>, StoreError>;

    async fn find_lesson(&self, lesson_id: DbId) -> Result<Option<Lesson>, StoreError>;

    /// Every lesson of a course in ascending order.
    async fn list_lessons(&self, course_id: DbId) -> Result<Vec<Lesson>, StoreError>;

    async fn find_quiz_for_lesson(&self, lesson_id: DbId) -> Result<Option<Quiz>, StoreError>;

    // --- Progress ---

    async fn list_progress(&self, user_id: DbId, course_id: DbId)
        -> Result<Vec<Progress>, StoreError>;

    /// Ids of the course's lessons with `completed = true` for the user.
    async fn completed_lesson_ids(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<HashSet<DbId>, StoreError>;

    /// Upsert the row and bump `last_accessed_at`, leaving flags alone.
    async fn record_access(&self, user_id: DbId, lesson: &Lesson) -> Result<Progress, StoreError>;

    /// Upsert `video_watched`; with `auto_complete` also `completed`.
    async fn mark_video_watched(
        &self,
        user_id: DbId,
        lesson: &Lesson,
        auto_complete: bool,
    ) -> Result<Progress, StoreError>;

    /// Upsert `quiz_completed` and `completed` (and `video_watched`).
    async fn mark_quiz_passed(&self, user_id: DbId, lesson: &Lesson)
        -> Result<Progress, StoreError>;

    // --- Quiz attempt log ---

    async fn append_quiz_attempt(&self, input: &NewQuizAttempt)
        -> Result<QuizAttempt, StoreError>;

    async fn list_quiz_attempts(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Vec<QuizAttempt>, StoreError>;

    // --- Phase progress ---

    async fn find_phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<PhaseProgress>, StoreError>;

    /// Create the pair's phase row in `enrolled` state if missing.
    async fn ensure_phase_progress(&self, user_id: DbId, course_id: DbId)
        -> Result<(), StoreError>;

    /// Single-winner conditional claim of phase 1 completion. `Some` only
    /// for the caller whose update flipped `phase1_completed_at` from null.
    async fn claim_phase1_completion(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Timestamp>, StoreError>;

    /// Delete the pair's progress rows and re-arm its phase row, all or
    /// nothing. Returns the number of progress rows removed.
    async fn reset_course_progress(&self, user_id: DbId, course_id: DbId)
        -> Result<u64, StoreError>;
}
