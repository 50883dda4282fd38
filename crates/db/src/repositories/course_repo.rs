//! Repositories for the `courses`, `lessons` and `quizzes` tables.
//!
//! The `create` methods exist for seeding and tests; course authoring is
//! owned by the admin tooling.

use lectern_core::types::DbId;
use sqlx::PgPool;

use crate::models::course::{Course, Lesson, Quiz};

/// Column list for `courses` queries.
const COURSE_COLUMNS: &str = "id, title, created_at, updated_at";

/// Column list for `lessons` queries.
const LESSON_COLUMNS: &str = "id, course_id, title, sort_order, created_at, updated_at";

/// Column list for `quizzes` queries.
const QUIZ_COLUMNS: &str = "id, lesson_id, passing_score, max_attempts, created_at, updated_at";

/// Provides read access to courses.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course, returning the created row.
    pub async fn create(pool: &PgPool, title: &str) -> Result<Course, sqlx::Error> {
        let query = format!("INSERT INTO courses (title) VALUES ($1) RETURNING {COURSE_COLUMNS}");
        sqlx::query_as::<_, Course>(&query)
            .bind(title)
            .fetch_one(pool)
            .await
    }

    /// Find a course by its internal id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

/// Provides read access to lessons.
pub struct LessonRepo;

impl LessonRepo {
    /// Insert a new lesson at `sort_order` within a course.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        title: &str,
        sort_order: i32,
    ) -> Result<Lesson, sqlx::Error> {
        let query = format!(
            "INSERT INTO lessons (course_id, title, sort_order) \
             VALUES ($1, $2, $3) \
             RETURNING {LESSON_COLUMNS}"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(course_id)
            .bind(title)
            .bind(sort_order)
            .fetch_one(pool)
            .await
    }

    /// Find a lesson by its internal id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lesson>, sqlx::Error> {
        let query = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1");
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every lesson of a course in ascending `sort_order`.
    pub async fn list_by_course(pool: &PgPool, course_id: DbId) -> Result<Vec<Lesson>, sqlx::Error> {
        let query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY sort_order ASC"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }
}

/// Provides read access to quizzes.
pub struct QuizRepo;

impl QuizRepo {
    /// Attach a quiz to a lesson.
    pub async fn create(
        pool: &PgPool,
        lesson_id: DbId,
        passing_score: i32,
        max_attempts: Option<i32>,
    ) -> Result<Quiz, sqlx::Error> {
        let query = format!(
            "INSERT INTO quizzes (lesson_id, passing_score, max_attempts) \
             VALUES ($1, $2, $3) \
             RETURNING {QUIZ_COLUMNS}"
        );
        sqlx::query_as::<_, Quiz>(&query)
            .bind(lesson_id)
            .bind(passing_score)
            .bind(max_attempts)
            .fetch_one(pool)
            .await
    }

    /// Find the quiz attached to a lesson, if any.
    pub async fn find_by_lesson(pool: &PgPool, lesson_id: DbId) -> Result<Option<Quiz>, sqlx::Error> {
        let query = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE lesson_id = $1");
        sqlx::query_as::<_, Quiz>(&query)
            .bind(lesson_id)
            .fetch_optional(pool)
            .await
    }
}
