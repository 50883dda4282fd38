//! Course completion check and the atomic phase 1 claim.
//!
//! The check is a pure read and fails closed: if the store cannot answer,
//! the course is treated as not completed and the next progress event will
//! evaluate it again. The claim is a single conditional update in the
//! store, so any number of concurrent callers produce exactly one winner,
//! and only the winner dispatches the notice.
//!
//! Once the claim is committed no retry can win it again, so the fan-out
//! runs on its own task. Dropping the request future (client disconnect,
//! request timeout) detaches the task instead of cancelling delivery.

use std::sync::Arc;

use lectern_core::completion;
use lectern_core::types::DbId;
use lectern_db::models::progress::Progress;
use lectern_db::store::StoreError;
use lectern_events::{CompletionNotice, DispatchReport};

use super::{CompletionOutcome, EngineError, ProgressionEngine};

impl ProgressionEngine {
    /// Whether every lesson of the course is completed for the learner.
    /// A course without lessons is never completed. Read failures yield
    /// `false`.
    pub async fn is_course_fully_completed(&self, user_id: DbId, course_id: DbId) -> bool {
        match self.load_course_completion(user_id, course_id).await {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    course_id,
                    error = %e,
                    "Completion check failed, treating course as incomplete"
                );
                false
            }
        }
    }

    async fn load_course_completion(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<bool, StoreError> {
        let lessons = self.store.list_lessons(course_id).await?;
        let lesson_ids: Vec<DbId> = lessons.iter().map(|l| l.id).collect();
        let completed = self.store.completed_lesson_ids(user_id, course_id).await?;
        Ok(completion::is_course_fully_completed(&lesson_ids, &completed))
    }

    /// Run the completion path after a progress upsert. Only a completed
    /// lesson row can finish a course, so anything else short-circuits.
    pub(super) async fn after_progress(
        &self,
        user_id: DbId,
        progress: &Progress,
    ) -> Result<CompletionOutcome, EngineError> {
        if !progress.completed {
            return Ok(CompletionOutcome::NotCompleted);
        }
        self.evaluate_completion(user_id, progress.course_id).await
    }

    /// Check the course and, when fully completed, attempt the claim.
    ///
    /// Idempotent: after the first winner every further call returns
    /// [`CompletionOutcome::AlreadyClaimed`] until the pair is reset.
    pub async fn evaluate_completion(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<CompletionOutcome, EngineError> {
        if !self.is_course_fully_completed(user_id, course_id).await {
            return Ok(CompletionOutcome::NotCompleted);
        }

        // Load the title before claiming so a winner always has a notice to
        // send. Failing here leaves the gate armed.
        let course = match self.store.find_course(course_id).await {
            Ok(Some(course)) => course,
            Ok(None) => {
                tracing::warn!(user_id, course_id, "Completed course no longer exists");
                return Ok(CompletionOutcome::NotCompleted);
            }
            Err(e) => {
                tracing::warn!(user_id, course_id, error = %e, "Course lookup failed before claim");
                return Ok(CompletionOutcome::NotCompleted);
            }
        };

        self.store
            .ensure_phase_progress(user_id, course_id)
            .await
            .map_err(EngineError::Gate)?;

        let claimed = self
            .store
            .claim_phase1_completion(user_id, course_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id, course_id, error = %e, "Phase 1 claim failed");
                EngineError::Gate(e)
            })?;

        let Some(completed_at) = claimed else {
            tracing::debug!(user_id, course_id, "Phase 1 already claimed");
            return Ok(CompletionOutcome::AlreadyClaimed);
        };

        tracing::info!(user_id, course_id, %completed_at, "Phase 1 completion claimed");

        let notice = CompletionNotice {
            user_id,
            course_id,
            course_title: course.title,
            completed_at,
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        let delivery = tokio::spawn(async move { dispatcher.dispatch(&notice).await });
        let notifications = match delivery.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(user_id, course_id, error = %e, "Notification task failed");
                DispatchReport::default()
            }
        };

        Ok(CompletionOutcome::Claimed {
            completed_at,
            notifications,
        })
    }
}
