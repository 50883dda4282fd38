//! Learner events: video ended, quiz submitted, lesson opened.
//!
//! Every write is an idempotent upsert keyed on (user, lesson), so a client
//! may safely resend any event. Timestamps are first-write-wins and flags
//! only ever move from `false` to `true`.

use lectern_core::error::CoreError;
use lectern_core::progression::{self, LessonRef, ProgressByLesson};
use lectern_core::quiz;
use lectern_core::types::DbId;
use lectern_db::models::course::Lesson;
use lectern_db::models::progress::Progress;
use lectern_db::models::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use serde::{Deserialize, Serialize};

use super::{CompletionOutcome, EngineError, LessonUpdate, ProgressionEngine};

/// A quiz submission as reported by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmission {
    /// When given, must be the quiz attached to the lesson.
    #[serde(default)]
    pub quiz_id: Option<DbId>,
    pub score: i32,
    /// Client-graded result. Must agree with the quiz's passing score;
    /// derived from it when absent.
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default = "empty_answers")]
    pub answers: serde_json::Value,
}

fn empty_answers() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub attempt: QuizAttempt,
    /// The updated row; `None` for a failed attempt, which changes no flags.
    pub progress: Option<Progress>,
    pub completion: CompletionOutcome,
    pub attempts_used: i64,
    /// `None` when the quiz has no attempt limit.
    pub attempts_remaining: Option<i64>,
}

impl ProgressionEngine {
    /// The learner finished the lesson video.
    ///
    /// Marks the video watched. A lesson without a quiz is completed by
    /// this alone; a lesson with a quiz waits for a passing attempt.
    pub async fn on_video_ended(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<LessonUpdate, EngineError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let has_quiz = self.store.find_quiz_for_lesson(lesson.id).await?.is_some();

        let progress = self
            .store
            .mark_video_watched(user_id, &lesson, !has_quiz)
            .await?;

        tracing::info!(
            user_id,
            lesson_id,
            course_id = lesson.course_id,
            completed = progress.completed,
            "Video watched recorded"
        );

        let completion = self.after_progress(user_id, &progress).await?;
        Ok(LessonUpdate {
            progress,
            completion,
        })
    }

    /// The learner submitted a quiz attempt.
    ///
    /// The attempt is always appended to the log. Only a passing attempt
    /// touches the progress row, and it also marks the video watched so a
    /// completed row is never missing its video flag.
    pub async fn on_quiz_submitted(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        input: QuizSubmission,
    ) -> Result<QuizResult, EngineError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let quiz = self
            .store
            .find_quiz_for_lesson(lesson.id)
            .await?
            .ok_or_else(|| CoreError::Validation(format!("Lesson {lesson_id} has no quiz")))?;

        if let Some(quiz_id) = input.quiz_id {
            if quiz_id != quiz.id {
                return Err(CoreError::Validation(format!(
                    "Quiz {quiz_id} does not belong to lesson {lesson_id}"
                ))
                .into());
            }
        }
        quiz::validate_score(input.score)?;

        let passed = quiz::resolve_passed(input.score, quiz.passing_score, input.passed)?;
        let attempt = self
            .store
            .append_quiz_attempt(&NewQuizAttempt {
                user_id,
                lesson_id,
                quiz_id: quiz.id,
                score: input.score,
                passed,
                answers: input.answers,
            })
            .await?;

        let attempts_used = self.store.list_quiz_attempts(user_id, lesson_id).await?.len() as i64;
        let attempts_remaining = quiz::attempts_remaining(quiz.max_attempts, attempts_used);

        tracing::info!(
            user_id,
            lesson_id,
            quiz_id = quiz.id,
            score = input.score,
            passed,
            attempts_used,
            "Quiz attempt recorded"
        );

        if !passed {
            return Ok(QuizResult {
                attempt,
                progress: None,
                completion: CompletionOutcome::NotCompleted,
                attempts_used,
                attempts_remaining,
            });
        }

        let progress = self.store.mark_quiz_passed(user_id, &lesson).await?;
        let completion = self.after_progress(user_id, &progress).await?;

        Ok(QuizResult {
            attempt,
            progress: Some(progress),
            completion,
            attempts_used,
            attempts_remaining,
        })
    }

    /// The learner opened a lesson. Rejected when the lesson is locked.
    pub async fn record_access(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Progress, EngineError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let state = self.load_course_state(user_id, lesson.course_id).await?;

        if !progression::is_unlocked(lesson.sort_order, &state.refs, &state.progress) {
            tracing::debug!(user_id, lesson_id, "Access to locked lesson rejected");
            return Err(CoreError::Forbidden(format!(
                "Lesson {lesson_id} is locked until the previous lesson is completed"
            ))
            .into());
        }

        Ok(self.store.record_access(user_id, &lesson).await?)
    }

    /// One read of the course catalog plus the learner's progress rows.
    pub(super) async fn load_course_state(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<CourseState, EngineError> {
        let lessons = self.store.list_lessons(course_id).await?;
        let rows = self.store.list_progress(user_id, course_id).await?;

        let refs = lessons.iter().map(|l| l.lesson_ref()).collect();
        let progress = rows.iter().map(|p| (p.lesson_id, p.flags())).collect();
        Ok(CourseState {
            lessons,
            refs,
            progress,
        })
    }
}

/// A course's lessons and one learner's progress on them.
pub(super) struct CourseState {
    pub lessons: Vec<Lesson>,
    pub refs: Vec<LessonRef>,
    pub progress: ProgressByLesson,
}
