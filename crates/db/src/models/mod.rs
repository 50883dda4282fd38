//! Row types mapped from the database with `sqlx::FromRow`.

pub mod course;
pub mod phase_progress;
pub mod progress;
pub mod quiz_attempt;
