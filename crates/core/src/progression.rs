//! Lesson unlock policy.
//!
//! This is the single source of truth for "may the learner open lesson N".
//! The API's lesson listing, the access check and the engine all call into
//! these functions; nothing else re-derives lock state.
//!
//! Lessons are ordered by their 1-based `order` within a course. Gaps are
//! tolerated: the lesson preceding N is the one with the largest order
//! strictly less than N, not literally `N - 1`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A lesson's identity and position within its course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonRef {
    pub id: DbId,
    pub order: i32,
}

/// The completion-relevant flags of one progress row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LessonProgress {
    pub video_watched: bool,
    pub quiz_completed: bool,
    pub completed: bool,
}

/// Rendered state of a lesson for a single learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonState {
    Locked,
    Unlocked,
    Completed,
}

/// Progress rows keyed by lesson id. A missing entry means the learner has
/// never produced an event for that lesson.
pub type ProgressByLesson = HashMap<DbId, LessonProgress>;

// ---------------------------------------------------------------------------
// Ordering helpers
// ---------------------------------------------------------------------------

/// The lesson immediately preceding `order`: largest order strictly less
/// than `order`.
pub fn previous_lesson(order: i32, lessons: &[LessonRef]) -> Option<&LessonRef> {
    lessons
        .iter()
        .filter(|l| l.order < order)
        .max_by_key(|l| l.order)
}

fn is_completed(lesson_id: DbId, progress: &ProgressByLesson) -> bool {
    progress.get(&lesson_id).is_some_and(|p| p.completed)
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Decide whether the lesson at `lesson_order` is accessible.
///
/// - The first lesson of the course is always unlocked.
/// - Any other lesson is unlocked iff its preceding lesson is completed.
/// - A preceding lesson without a progress row counts as not completed.
/// - An order that matches no lesson in `lessons` is never unlocked.
pub fn is_unlocked(lesson_order: i32, lessons: &[LessonRef], progress: &ProgressByLesson) -> bool {
    if !lessons.iter().any(|l| l.order == lesson_order) {
        return false;
    }

    match previous_lesson(lesson_order, lessons) {
        None => true,
        Some(prev) => is_completed(prev.id, progress),
    }
}

/// Render the state of one lesson. A completed lesson reports `Completed`
/// even when its predecessor has since been reset.
pub fn lesson_state(
    lesson: &LessonRef,
    lessons: &[LessonRef],
    progress: &ProgressByLesson,
) -> LessonState {
    if is_completed(lesson.id, progress) {
        LessonState::Completed
    } else if is_unlocked(lesson.order, lessons, progress) {
        LessonState::Unlocked
    } else {
        LessonState::Locked
    }
}

/// Render every lesson of a course in ascending order.
pub fn lesson_states(
    lessons: &[LessonRef],
    progress: &ProgressByLesson,
) -> Vec<(LessonRef, LessonState)> {
    let mut ordered: Vec<LessonRef> = lessons.to_vec();
    ordered.sort_by_key(|l| l.order);
    ordered
        .into_iter()
        .map(|l| (l, lesson_state(&l, lessons, progress)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
