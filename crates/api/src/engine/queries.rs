//! Read models served to clients.

use lectern_core::completion;
use lectern_core::phase::{INITIAL_PHASE, PHASE_STATUS_ENROLLED};
use lectern_core::progression::{self, LessonState};
use lectern_core::quiz;
use lectern_core::types::{DbId, Timestamp};
use lectern_db::models::quiz_attempt::QuizAttempt;
use serde::Serialize;

use super::{EngineError, ProgressionEngine};

/// One lesson as the learner sees it.
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub lesson_id: DbId,
    pub title: String,
    pub order: i32,
    pub state: LessonState,
}

/// Course-level phase progress plus lesson counts.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseView {
    pub user_id: DbId,
    pub course_id: DbId,
    pub current_phase: i32,
    pub status: String,
    pub phase1_completed_at: Option<Timestamp>,
    pub lessons_total: usize,
    pub lessons_completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptLog {
    pub attempts: Vec<QuizAttempt>,
    pub max_attempts: Option<i32>,
    pub attempts_remaining: Option<i64>,
}

impl ProgressionEngine {
    /// Every lesson of the course in order with its lock state.
    pub async fn lesson_states(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Vec<LessonView>, EngineError> {
        self.require_course(course_id).await?;
        let course = self.load_course_state(user_id, course_id).await?;

        let views = progression::lesson_states(&course.refs, &course.progress)
            .into_iter()
            .filter_map(|(lesson_ref, state)| {
                course
                    .lessons
                    .iter()
                    .find(|l| l.id == lesson_ref.id)
                    .map(|l| LessonView {
                        lesson_id: l.id,
                        title: l.title.clone(),
                        order: l.sort_order,
                        state,
                    })
            })
            .collect();
        Ok(views)
    }

    /// The pair's phase row. A learner with no row yet is reported as
    /// enrolled in phase 1; nothing is written.
    pub async fn phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<PhaseView, EngineError> {
        self.require_course(course_id).await?;
        let lesson_ids: Vec<DbId> = self
            .store
            .list_lessons(course_id)
            .await?
            .iter()
            .map(|l| l.id)
            .collect();
        let completed = self.store.completed_lesson_ids(user_id, course_id).await?;
        let remaining = completion::remaining_lessons(&lesson_ids, &completed);
        let row = self.store.find_phase_progress(user_id, course_id).await?;

        let (current_phase, status, phase1_completed_at) = match row {
            Some(row) => (row.current_phase, row.status, row.phase1_completed_at),
            None => (INITIAL_PHASE, PHASE_STATUS_ENROLLED.to_string(), None),
        };

        Ok(PhaseView {
            user_id,
            course_id,
            current_phase,
            status,
            phase1_completed_at,
            lessons_total: lesson_ids.len(),
            lessons_completed: lesson_ids.len() - remaining,
        })
    }

    /// The learner's attempts for a lesson's quiz, oldest first.
    pub async fn quiz_attempts(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<AttemptLog, EngineError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let quiz = self.store.find_quiz_for_lesson(lesson.id).await?;
        let attempts = self.store.list_quiz_attempts(user_id, lesson_id).await?;

        let max_attempts = quiz.and_then(|q| q.max_attempts);
        let attempts_remaining = quiz::attempts_remaining(max_attempts, attempts.len() as i64);

        Ok(AttemptLog {
            attempts,
            max_attempts,
            attempts_remaining,
        })
    }
}
