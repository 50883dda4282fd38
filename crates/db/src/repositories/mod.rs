//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod course_repo;
pub mod phase_progress_repo;
pub mod progress_repo;
pub mod quiz_attempt_repo;

pub use course_repo::{CourseRepo, LessonRepo, QuizRepo};
pub use phase_progress_repo::PhaseProgressRepo;
pub use progress_repo::ProgressRepo;
pub use quiz_attempt_repo::QuizAttemptRepo;
