//! The phase-completion payload.

use lectern_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// Event name used wherever the notice is republished as a
/// [`PlatformEvent`](crate::PlatformEvent) or posted to a webhook.
pub const EVENT_PHASE1_COMPLETED: &str = "course.phase1_completed";

/// Sent exactly once per claimed (user, course) phase 1 completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub user_id: DbId,
    pub course_id: DbId,
    pub course_title: String,
    /// The timestamp written by the winning claim.
    pub completed_at: Timestamp,
}

impl CompletionNotice {
    /// One-line human readable summary, used as the email subject.
    pub fn summary(&self) -> String {
        format!(
            "User {} completed phase 1 of \"{}\"",
            self.user_id, self.course_title
        )
    }
}
