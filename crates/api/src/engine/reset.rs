//! Administrative reset of a learner's course progress.

use lectern_core::types::DbId;
use serde::Serialize;

use super::{EngineError, ProgressionEngine};

#[derive(Debug, Clone, Serialize)]
pub struct ResetSummary {
    pub user_id: DbId,
    pub course_id: DbId,
    pub progress_rows_deleted: u64,
}

impl ProgressionEngine {
    /// Delete the learner's progress rows for the course and re-arm the
    /// phase 1 claim, atomically. Quiz attempts are kept as history.
    /// Completing the course again dispatches a new notice.
    pub async fn on_admin_reset(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<ResetSummary, EngineError> {
        self.require_course(course_id).await?;
        let deleted = self.store.reset_course_progress(user_id, course_id).await?;

        tracing::info!(
            user_id,
            course_id,
            progress_rows_deleted = deleted,
            "Course progress reset"
        );

        Ok(ResetSummary {
            user_id,
            course_id,
            progress_rows_deleted: deleted,
        })
    }
}
