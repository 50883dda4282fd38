//! Quiz scoring rules.
//!
//! Scores are integer percentages. Grading the learner's answers is the
//! quiz component's job; the engine only validates and records the outcome.

use crate::error::CoreError;

/// Lowest valid score.
pub const MIN_SCORE: i32 = 0;

/// Highest valid score.
pub const MAX_SCORE: i32 = 100;

/// Validate that a score is a percentage in `MIN_SCORE..=MAX_SCORE`.
pub fn validate_score(score: i32) -> Result<(), CoreError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(CoreError::Validation(format!(
            "Score must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )));
    }
    Ok(())
}

/// A score passes when it reaches the quiz's passing score.
pub fn is_passing(score: i32, passing_score: i32) -> bool {
    score >= passing_score
}

/// Resolve the pass/fail outcome of an attempt from its score.
///
/// The quiz component may report the outcome it graded; a report that
/// disagrees with `score >= passing_score` is rejected.
pub fn resolve_passed(
    score: i32,
    passing_score: i32,
    reported: Option<bool>,
) -> Result<bool, CoreError> {
    let passed = is_passing(score, passing_score);
    match reported {
        Some(claimed) if claimed != passed => Err(CoreError::Validation(format!(
            "Reported passed={claimed} contradicts score {score} against passing score {passing_score}"
        ))),
        _ => Ok(passed),
    }
}

/// Attempts left under `max_attempts`, or `None` when unlimited.
///
/// Informational only: attempts beyond the limit are still recorded.
pub fn attempts_remaining(max_attempts: Option<i32>, attempts_used: i64) -> Option<i64> {
    max_attempts.map(|max| (i64::from(max) - attempts_used).max(0))
}
