//! Course completion predicate.
//!
//! A course is fully completed for a learner when every lesson in the course
//! has a completed progress row. A course with no lessons is never
//! completed, so an empty catalog can never arm the completion gate.

use std::collections::HashSet;

use crate::types::DbId;

/// Returns `true` iff `lesson_ids` is non-empty and every id in it appears
/// in `completed_ids`. Extra ids in `completed_ids` are ignored.
pub fn is_course_fully_completed(lesson_ids: &[DbId], completed_ids: &HashSet<DbId>) -> bool {
    !lesson_ids.is_empty() && lesson_ids.iter().all(|id| completed_ids.contains(id))
}

/// Number of lessons still missing a completed progress row.
pub fn remaining_lessons(lesson_ids: &[DbId], completed_ids: &HashSet<DbId>) -> usize {
    lesson_ids
        .iter()
        .filter(|id| !completed_ids.contains(id))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[DbId]) -> HashSet<DbId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn empty_course_is_never_complete() {
        assert!(!is_course_fully_completed(&[], &set(&[])));
        assert!(!is_course_fully_completed(&[], &set(&[1, 2])));
    }

    #[test]
    fn all_lessons_completed() {
        assert!(is_course_fully_completed(&[1, 2, 3], &set(&[1, 2, 3])));
    }

    #[test]
    fn one_missing_lesson_blocks_completion() {
        assert!(!is_course_fully_completed(&[1, 2, 3], &set(&[1, 3])));
        assert_eq!(remaining_lessons(&[1, 2, 3], &set(&[1, 3])), 1);
    }

    #[test]
    fn extraneous_completed_rows_are_ignored() {
        assert!(is_course_fully_completed(&[1, 2], &set(&[1, 2, 99])));
        assert_eq!(remaining_lessons(&[1, 2], &set(&[1, 2, 99])), 0);
    }
}
