//! In-process [`ProgressStore`].
//!
//! All state lives behind one async mutex and every trait method runs as a
//! single critical section, so the conditional phase claim is atomic with
//! respect to every other caller in the process. It gives no guarantees
//! across processes; production deployments use [`PgProgressStore`].
//!
//! Faults can be injected with [`MemoryProgressStore::set_unavailable`],
//! [`MemoryProgressStore::set_fail_claims`] and
//! [`MemoryProgressStore::set_fail_completion_reads`].
//!
//! [`PgProgressStore`]: super::PgProgressStore

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use lectern_core::phase::{
    INITIAL_PHASE, PHASE_AFTER_PHASE1, PHASE_STATUS_ENROLLED, PHASE_STATUS_PHASE1_COMPLETED,
};
use lectern_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::models::course::{Course, Lesson, Quiz};
use crate::models::phase_progress::PhaseProgress;
use crate::models::progress::Progress;
use crate::models::quiz_attempt::{NewQuizAttempt, QuizAttempt};

use super::{ProgressStore, StoreError};

/// (user_id, lesson_id) or (user_id, course_id).
type PairKey = (DbId, DbId);

#[derive(Default)]
struct State {
    next_id: DbId,
    courses: HashMap<DbId, Course>,
    lessons: HashMap<DbId, Lesson>,
    quizzes: HashMap<DbId, Quiz>,
    progress: HashMap<PairKey, Progress>,
    attempts: Vec<QuizAttempt>,
    phases: HashMap<PairKey, PhaseProgress>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    /// Get or lazily create the progress row for (user, lesson).
    fn progress_row(&mut self, user_id: DbId, lesson: &Lesson, now: Timestamp) -> &mut Progress {
        let key = (user_id, lesson.id);
        let fresh_id = if self.progress.contains_key(&key) {
            0
        } else {
            self.next_id()
        };
        let row = self.progress.entry(key).or_insert_with(|| Progress {
            id: fresh_id,
            user_id,
            course_id: lesson.course_id,
            lesson_id: lesson.id,
            video_watched: false,
            video_watched_at: None,
            quiz_completed: false,
            quiz_completed_at: None,
            completed: false,
            completed_at: None,
            last_accessed_at: now,
            created_at: now,
            updated_at: now,
        });
        row.last_accessed_at = now;
        row.updated_at = now;
        row
    }

    fn ensure_phase(&mut self, user_id: DbId, course_id: DbId, now: Timestamp) {
        if self.phases.contains_key(&(user_id, course_id)) {
            return;
        }
        let id = self.next_id();
        self.phases.insert(
            (user_id, course_id),
            PhaseProgress {
                id,
                user_id,
                course_id,
                phase1_completed_at: None,
                current_phase: INITIAL_PHASE,
                status: PHASE_STATUS_ENROLLED.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
    }
}

fn mark_video(row: &mut Progress, now: Timestamp) {
    row.video_watched = true;
    row.video_watched_at.get_or_insert(now);
}

fn mark_completed(row: &mut Progress, now: Timestamp) {
    row.completed = true;
    row.completed_at.get_or_insert(now);
}

// ---------------------------------------------------------------------------
// MemoryProgressStore
// ---------------------------------------------------------------------------

/// Process-local store for tests and database-less local runs.
#[derive(Default)]
pub struct MemoryProgressStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
    fail_claims: AtomicBool,
    fail_completion_reads: AtomicBool,
    lesson_list_reads: AtomicUsize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    /// Make only the phase claim fail.
    pub fn set_fail_claims(&self, value: bool) {
        self.fail_claims.store(value, Ordering::SeqCst);
    }

    /// Make only [`ProgressStore::completed_lesson_ids`] fail.
    pub fn set_fail_completion_reads(&self, value: bool) {
        self.fail_completion_reads.store(value, Ordering::SeqCst);
    }

    /// How many times [`ProgressStore::list_lessons`] has been called.
    pub fn lesson_list_reads(&self) -> usize {
        self.lesson_list_reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }

    // --- Catalog seeding ---

    pub async fn add_course(&self, title: &str) -> Course {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let course = Course {
            id: state.next_id(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.courses.insert(course.id, course.clone());
        course
    }

    pub async fn add_lesson(&self, course_id: DbId, title: &str, sort_order: i32) -> Lesson {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let lesson = Lesson {
            id: state.next_id(),
            course_id,
            title: title.to_string(),
            sort_order,
            created_at: now,
            updated_at: now,
        };
        state.lessons.insert(lesson.id, lesson.clone());
        lesson
    }

    pub async fn add_quiz(&self, lesson_id: DbId, passing_score: i32, max_attempts: Option<i32>) -> Quiz {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let quiz = Quiz {
            id: state.next_id(),
            lesson_id,
            passing_score,
            max_attempts,
            created_at: now,
            updated_at: now,
        };
        state.quizzes.insert(quiz.id, quiz.clone());
        quiz
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn find_course(&self, course_id: DbId) -> Result<Option<Course>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.courses.get(&course_id).cloned())
    }

    async fn find_lesson(&self, lesson_id: DbId) -> Result<Option<Lesson>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.lessons.get(&lesson_id).cloned())
    }

    async fn list_lessons(&self, course_id: DbId) -> Result<Vec<Lesson>, StoreError> {
        self.lesson_list_reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let state = self.state.lock().await;
        let mut lessons: Vec<Lesson> = state
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.sort_order);
        Ok(lessons)
    }

    async fn find_quiz_for_lesson(&self, lesson_id: DbId) -> Result<Option<Quiz>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.quizzes.values().find(|q| q.lesson_id == lesson_id).cloned())
    }

    async fn list_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Vec<Progress>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut rows: Vec<Progress> = state
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.lesson_id);
        Ok(rows)
    }

    async fn completed_lesson_ids(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<HashSet<DbId>, StoreError> {
        self.check_available()?;
        if self.fail_completion_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("completion read failed".into()));
        }
        let state = self.state.lock().await;
        Ok(state
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.completed)
            .filter(|p| {
                state
                    .lessons
                    .get(&p.lesson_id)
                    .is_some_and(|l| l.course_id == course_id)
            })
            .map(|p| p.lesson_id)
            .collect())
    }

    async fn record_access(&self, user_id: DbId, lesson: &Lesson) -> Result<Progress, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.progress_row(user_id, lesson, Utc::now()).clone())
    }

    async fn mark_video_watched(
        &self,
        user_id: DbId,
        lesson: &Lesson,
        auto_complete: bool,
    ) -> Result<Progress, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let row = state.progress_row(user_id, lesson, now);
        mark_video(row, now);
        if auto_complete {
            mark_completed(row, now);
        }
        Ok(row.clone())
    }

    async fn mark_quiz_passed(
        &self,
        user_id: DbId,
        lesson: &Lesson,
    ) -> Result<Progress, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let row = state.progress_row(user_id, lesson, now);
        mark_video(row, now);
        row.quiz_completed = true;
        row.quiz_completed_at.get_or_insert(now);
        mark_completed(row, now);
        Ok(row.clone())
    }

    async fn append_quiz_attempt(
        &self,
        input: &NewQuizAttempt,
    ) -> Result<QuizAttempt, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let attempt = QuizAttempt {
            id: state.next_id(),
            user_id: input.user_id,
            lesson_id: input.lesson_id,
            quiz_id: input.quiz_id,
            score: input.score,
            passed: input.passed,
            answers: input.answers.clone(),
            created_at: Utc::now(),
        };
        state.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn list_quiz_attempts(
        &self,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Vec<QuizAttempt>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn find_phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<PhaseProgress>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.phases.get(&(user_id, course_id)).cloned())
    }

    async fn ensure_phase_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.state
            .lock()
            .await
            .ensure_phase(user_id, course_id, Utc::now());
        Ok(())
    }

    async fn claim_phase1_completion(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Timestamp>, StoreError> {
        self.check_available()?;
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("phase claim failed".into()));
        }
        let mut state = self.state.lock().await;
        let Some(row) = state.phases.get_mut(&(user_id, course_id)) else {
            return Ok(None);
        };
        if row.phase1_completed_at.is_some() {
            return Ok(None);
        }
        let now = Utc::now();
        row.phase1_completed_at = Some(now);
        row.current_phase = PHASE_AFTER_PHASE1;
        row.status = PHASE_STATUS_PHASE1_COMPLETED.to_string();
        row.updated_at = now;
        Ok(Some(now))
    }

    async fn reset_course_progress(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.progress.len();
        state
            .progress
            .retain(|_, p| !(p.user_id == user_id && p.course_id == course_id));
        let deleted = (before - state.progress.len()) as u64;

        let now = Utc::now();
        state.ensure_phase(user_id, course_id, now);
        if let Some(row) = state.phases.get_mut(&(user_id, course_id)) {
            row.phase1_completed_at = None;
            row.current_phase = INITIAL_PHASE;
            row.status = PHASE_STATUS_ENROLLED.to_string();
            row.updated_at = now;
        }
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
