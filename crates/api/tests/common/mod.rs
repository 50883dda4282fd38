#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use lectern_api::config::ServerConfig;
use lectern_api::engine::{ProgressionEngine, QuizSubmission};
use lectern_api::router::build_app_router;
use lectern_api::state::AppState;
use lectern_db::models::course::{Course, Lesson};
use lectern_db::store::MemoryProgressStore;
use lectern_events::{ChannelError, CompletionNotice, NotificationChannel, NotificationDispatcher};

pub const USER: i64 = 42;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Records every notice it is sent.
#[derive(Default)]
pub struct RecordingChannel {
    notices: Mutex<Vec<CompletionNotice>>,
}

impl RecordingChannel {
    pub async fn notices(&self) -> Vec<CompletionNotice> {
        self.notices.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.notices.lock().await.len()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError> {
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}

/// Records each notice after a fixed delay.
pub struct SlowChannel {
    delay: Duration,
    delivered: Mutex<usize>,
}

impl SlowChannel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            delivered: Mutex::new(0),
        }
    }

    pub async fn count(&self) -> usize {
        *self.delivered.lock().await
    }
}

#[async_trait]
impl NotificationChannel for SlowChannel {
    fn name(&self) -> &str {
        "slow"
    }

    async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
        tokio::time::sleep(self.delay).await;
        *self.delivered.lock().await += 1;
        Ok(())
    }
}

/// Always fails.
pub struct FailingChannel;

#[async_trait]
impl NotificationChannel for FailingChannel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(&self, _notice: &CompletionNotice) -> Result<(), ChannelError> {
        Err(ChannelError::Other("relay refused connection".into()))
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub store: Arc<MemoryProgressStore>,
    pub engine: Arc<ProgressionEngine>,
    pub recorder: Arc<RecordingChannel>,
}

impl Fixture {
    /// Engine over an empty in-memory store with a recording channel.
    pub fn new() -> Self {
        Self::with_channels(Vec::new())
    }

    /// As [`Fixture::new`], with `extra` channels registered before the
    /// recorder.
    pub fn with_channels(extra: Vec<Arc<dyn NotificationChannel>>) -> Self {
        let store = Arc::new(MemoryProgressStore::new());
        let recorder = Arc::new(RecordingChannel::default());

        let mut dispatcher = NotificationDispatcher::new(Duration::from_secs(2));
        for channel in extra {
            dispatcher.add_channel(channel);
        }
        dispatcher.add_channel(recorder.clone());

        let engine = Arc::new(ProgressionEngine::new(store.clone(), Arc::new(dispatcher)));
        Self {
            store,
            engine,
            recorder,
        }
    }

    /// Seed a course. Each entry is a lesson in order; `Some(passing)` gives
    /// it a quiz with that passing score.
    pub async fn seed_course(&self, title: &str, lessons: &[Option<i32>]) -> (Course, Vec<Lesson>) {
        let course = self.store.add_course(title).await;
        let mut created = Vec::new();
        for (i, quiz) in lessons.iter().enumerate() {
            let lesson = self
                .store
                .add_lesson(course.id, &format!("Lesson {}", i + 1), i as i32 + 1)
                .await;
            if let Some(passing) = quiz {
                self.store.add_quiz(lesson.id, *passing, None).await;
            }
            created.push(lesson);
        }
        (course, created)
    }

    pub fn app(&self) -> Router {
        let config = test_config();
        let state = AppState {
            engine: Arc::clone(&self.engine),
            config: Arc::new(config.clone()),
        };
        build_app_router(state, &config)
    }
}

pub fn submission(score: i32) -> QuizSubmission {
    QuizSubmission {
        quiz_id: None,
        score,
        passed: None,
        answers: serde_json::json!({}),
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not valid JSON")
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}
