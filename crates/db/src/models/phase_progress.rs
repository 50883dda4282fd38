//! Course-level phase progress model.

use lectern_core::phase;
use lectern_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `phase_progress` table, unique on `(user_id, course_id)`.
///
/// `phase1_completed_at` is set at most once per arming, by the completion
/// gate's conditional update. An administrative reset clears it again.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhaseProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub phase1_completed_at: Option<Timestamp>,
    pub current_phase: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PhaseProgress {
    /// Whether phase 1 completion has been claimed for this pair.
    pub fn is_phase1_completed(&self) -> bool {
        self.phase1_completed_at.is_some() && phase::is_phase1_completed(&self.status)
    }
}
