//! PostgreSQL-backed [`ProgressStore`].

use std::collections::HashSet;

use async_trait::async_trait;
use lectern_core::types::{DbId, Timestamp};

use crate::models::course::{Course, Lesson, Quiz};
use crate::models::phase_progress::PhaseProgress;
use crate::models::progress::Progress;
use crate::models::quiz_attempt::{NewQuizAttempt, QuizAttempt};
use crate::repositories::{
    CourseRepo, LessonRepo, PhaseProgressRepo, ProgressRepo, QuizAttemptRepo, QuizRepo,
};
use crate::DbPool;

use super::{ProgressStore, StoreError};

/// [`ProgressStore`] over a shared connection pool.
#[derive(Clone)]
pub struct PgProgressStore {
    pool: DbPool,
}

impl PgProgressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_course(&self, course_id: DbId) -> Result<Option<Course>, StoreError> {
        Ok(CourseRepo::find_by_id(&self.pool, course_id).await?)
    }

    async fn find_lesson(&self, lesson_id: DbId) -> Result<Option<Lesson>, StoreError> {
        Ok(LessonRepo::find_by_id(&self.pool, lesson_id).await?)
    }

    async fn list_lessons(&self, course_id: DbId) -> Result<Vec<Lesson>, StoreError> {
        Ok(LessonRepo::list_by_course(&self.pool, course_id).await?)
    }

    async fn find_quiz_for_lesson(&self, lesson_id: DbId) -> Result<Option<Quiz>, StoreError> {
        Ok(QuizRepo::find_by_lesson(&self.pool, lesson_id).await?)
    }

    async fn list_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Vec<Progress>, StoreError> {
        Ok(ProgressRepo::list_for_course(&self.pool, user_id, course_id).await?)
    }

    async fn completed_lesson_ids(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<HashSet<DbId>, StoreError> {
        Ok(ProgressRepo::completed_lesson_ids(&self.pool, user_id, course_id).await?)
    }

    async fn record_access(&self, user_id: DbId, lesson: &Lesson) -> Result<Progress, StoreError> {
        Ok(ProgressRepo::touch(&self.pool, user_id, lesson.course_id, lesson.id).await?)
    }

    async fn mark_video_watched(
        &self,
        user_id: DbId,
        lesson: &Lesson,
        auto_complete: bool,
    ) -> Result<Progress, StoreError> {
        Ok(ProgressRepo::mark_video_watched(
            &self.pool,
            user_id,
            lesson.course_id,
            lesson.id,
            auto_complete,
        )
        .await?)
    }

    async fn mark_quiz_passed(
        &self,
        user_id: DbId,
        lesson: &Lesson,
    ) -> Result<Progress, StoreError> {
        Ok(ProgressRepo::mark_quiz_passed(&self.pool, user_id, lesson.course_id, lesson.id).await?)
    }

    async fn append_quiz_attempt(
        &self,
        input: &NewQuizAttempt,
    ) -> Result<QuizAttempt, StoreError> {
        Ok(QuizAttemptRepo::create(&self.pool, input).await?)
    }

    async fn list_quiz_attempts(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Vec<QuizAttempt>, StoreError> {
        Ok(QuizAttemptRepo::list_for_lesson(&self.pool, user_id, lesson_id).await?)
    }

    async fn find_phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<PhaseProgress>, StoreError> {
        Ok(PhaseProgressRepo::find(&self.pool, user_id, course_id).await?)
    }

    async fn ensure_phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<(), StoreError> {
        Ok(PhaseProgressRepo::ensure_enrolled(&self.pool, user_id, course_id).await?)
    }

    async fn claim_phase1_completion(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Timestamp>, StoreError> {
        Ok(PhaseProgressRepo::claim_phase1(&self.pool, user_id, course_id).await?)
    }

    async fn reset_course_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<u64, StoreError> {
        Ok(ProgressRepo::reset_course(&self.pool, user_id, course_id).await?)
    }
}
