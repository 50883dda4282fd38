//! Lesson progression engine.
//!
//! [`ProgressionEngine`] turns learner events into progress upserts and, once
//! a course is fully completed, drives the exactly-once phase 1 claim and
//! the completion notification fan-out.
//!
//! - [`recorder`]: video, quiz and access events.
//! - [`completion`]: the completion check and the atomic claim.
//! - [`queries`]: read models (lesson states, phase view, attempt log).
//! - [`reset`]: admin reset of a learner's course progress.
//!
//! The engine holds no progress state of its own; every decision is made
//! from what the [`ProgressStore`] returns for that call.

use std::sync::Arc;

use lectern_core::error::CoreError;
use lectern_core::types::{DbId, Timestamp};
use lectern_db::models::course::{Course, Lesson};
use lectern_db::models::progress::Progress;
use lectern_db::store::{ProgressStore, StoreError};
use lectern_events::{DispatchReport, NotificationDispatcher};
use serde::Serialize;

pub mod completion;
pub mod queries;
pub mod recorder;
pub mod reset;

pub use queries::{AttemptLog, LessonView, PhaseView};
pub use recorder::{QuizResult, QuizSubmission};
pub use reset::ResetSummary;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Domain rule violation (unknown entity, invalid score, locked lesson).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Progress could not be read or written. Safe to retry.
    #[error("Progress store error: {0}")]
    Store(#[from] StoreError),

    /// The phase completion claim could not be executed. Nothing was
    /// dispatched.
    #[error("Completion gate failed: {0}")]
    Gate(#[source] StoreError),
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What the completion path decided for one event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// The course is not (yet) fully completed for the learner.
    NotCompleted,
    /// Fully completed, but another caller already won the claim.
    AlreadyClaimed,
    /// This call won the claim and dispatched the completion notice.
    Claimed {
        completed_at: Timestamp,
        notifications: DispatchReport,
    },
}

impl CompletionOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }

    /// Whether the course is fully completed, regardless of who claimed it.
    pub fn course_completed(&self) -> bool {
        !matches!(self, Self::NotCompleted)
    }
}

/// Result of a progress-changing event.
#[derive(Debug, Clone, Serialize)]
pub struct LessonUpdate {
    pub progress: Progress,
    pub completion: CompletionOutcome,
}

// ---------------------------------------------------------------------------
// ProgressionEngine
// ---------------------------------------------------------------------------

pub struct ProgressionEngine {
    store: Arc<dyn ProgressStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ProgressionEngine {
    pub fn new(store: Arc<dyn ProgressStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    async fn require_lesson(&self, lesson_id: DbId) -> Result<Lesson, EngineError> {
        self.store
            .find_lesson(lesson_id)
            .await?
            .ok_or(EngineError::Core(CoreError::NotFound {
                entity: "Lesson",
                id: lesson_id,
            }))
    }

    async fn require_course(&self, course_id: DbId) -> Result<Course, EngineError> {
        self.store
            .find_course(course_id)
            .await?
            .ok_or(EngineError::Core(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            }))
    }
}
