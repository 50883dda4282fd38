//! Course phase status constants.
//!
//! These must match the values stored in the `phase_progress.status` and
//! `phase_progress.current_phase` columns and written by the completion
//! gate's conditional update and the administrative reset.

/// The learner is enrolled and has not yet completed every lesson.
pub const PHASE_STATUS_ENROLLED: &str = "enrolled";

/// Every lesson is completed and the completion has been claimed.
pub const PHASE_STATUS_PHASE1_COMPLETED: &str = "phase1_completed";

/// Phase a freshly enrolled (or reset) learner starts in.
pub const INITIAL_PHASE: i32 = 1;

/// Phase a learner moves to once phase 1 completion has been claimed.
pub const PHASE_AFTER_PHASE1: i32 = 2;

/// Whether a stored status value denotes a claimed phase 1 completion.
pub fn is_phase1_completed(status: &str) -> bool {
    status == PHASE_STATUS_PHASE1_COMPLETED
}
