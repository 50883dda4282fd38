//! End-to-end behaviour of the progression engine on the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{submission, FailingChannel, Fixture, SlowChannel, USER};
use lectern_api::engine::{CompletionOutcome, EngineError, QuizSubmission};
use lectern_core::error::CoreError;
use lectern_core::progression::LessonState;
use lectern_events::{ChannelOutcome, NotificationChannel};

fn states(views: &[lectern_api::engine::LessonView]) -> Vec<LessonState> {
    views.iter().map(|v| v.state).collect()
}

// ---------------------------------------------------------------------------
// Scenario A: video-only lesson then quiz lesson
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_video_then_quiz_completes_once() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Foundations", &[None, Some(70)]).await;
    let (l1, l2) = (&lessons[0], &lessons[1]);

    // L1 has no quiz: the video alone completes it and unlocks L2.
    let update = fx.engine.on_video_ended(USER, l1.id).await.unwrap();
    assert!(update.progress.completed);
    assert_matches!(update.completion, CompletionOutcome::NotCompleted);
    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(states(&views), vec![LessonState::Completed, LessonState::Unlocked]);

    // A failing score is logged but changes nothing.
    let failed = fx
        .engine
        .on_quiz_submitted(USER, l2.id, submission(60))
        .await
        .unwrap();
    assert!(!failed.attempt.passed);
    assert!(failed.progress.is_none());
    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(states(&views), vec![LessonState::Completed, LessonState::Unlocked]);

    // A passing score completes L2, the last lesson, and claims the phase.
    let passed = fx
        .engine
        .on_quiz_submitted(USER, l2.id, submission(85))
        .await
        .unwrap();
    let progress = passed.progress.unwrap();
    assert!(progress.completed && progress.quiz_completed && progress.video_watched);
    assert_matches!(passed.completion, CompletionOutcome::Claimed { .. });
    assert_eq!(passed.attempts_used, 2);

    // Redelivered events after completion never notify again.
    let replay = fx.engine.on_video_ended(USER, l1.id).await.unwrap();
    assert_matches!(replay.completion, CompletionOutcome::AlreadyClaimed);
    let replay = fx
        .engine
        .on_quiz_submitted(USER, l2.id, submission(90))
        .await
        .unwrap();
    assert_matches!(replay.completion, CompletionOutcome::AlreadyClaimed);

    let notices = fx.recorder.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].user_id, USER);
    assert_eq!(notices[0].course_id, course.id);
    assert_eq!(notices[0].course_title, "Foundations");

    let phase = fx.engine.phase_progress(USER, course.id).await.unwrap();
    assert_eq!(phase.current_phase, 2);
    assert_eq!(phase.status, "phase1_completed");
    assert_eq!(phase.phase1_completed_at, Some(notices[0].completed_at));
    assert_eq!(phase.lessons_completed, 2);
}

// ---------------------------------------------------------------------------
// Scenario B: reset re-arms the gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_b_reset_rearms_completion() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Foundations", &[None, Some(70)]).await;

    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    fx.engine
        .on_quiz_submitted(USER, lessons[1].id, submission(85))
        .await
        .unwrap();
    assert_eq!(fx.recorder.count().await, 1);

    let summary = fx.engine.on_admin_reset(USER, course.id).await.unwrap();
    assert_eq!(summary.progress_rows_deleted, 2);

    let phase = fx.engine.phase_progress(USER, course.id).await.unwrap();
    assert_eq!(phase.phase1_completed_at, None);
    assert_eq!(phase.status, "enrolled");
    assert_eq!(phase.lessons_completed, 0);
    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(states(&views), vec![LessonState::Unlocked, LessonState::Locked]);

    // Attempt history survives a reset.
    let log = fx.engine.quiz_attempts(USER, lessons[1].id).await.unwrap();
    assert_eq!(log.attempts.len(), 1);

    // Replaying the sequence fires exactly one fresh notice.
    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    let again = fx
        .engine
        .on_quiz_submitted(USER, lessons[1].id, submission(85))
        .await
        .unwrap();
    assert_matches!(again.completion, CompletionOutcome::Claimed { .. });
    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();

    assert_eq!(fx.recorder.count().await, 2);
}

// ---------------------------------------------------------------------------
// Exactly-once under concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_final_events_dispatch_exactly_once() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Foundations", &[None, None, None]).await;
    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    fx.engine.on_video_ended(USER, lessons[1].id).await.unwrap();

    let last = lessons[2].id;
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&fx.engine);
            tokio::spawn(async move { engine.on_video_ended(USER, last).await })
        })
        .collect();

    let mut claimed = 0;
    for handle in handles {
        let update = handle.await.unwrap().unwrap();
        assert!(update.completion.course_completed());
        if update.completion.is_claimed() {
            claimed += 1;
        }
    }

    assert_eq!(claimed, 1);
    assert_eq!(fx.recorder.count().await, 1);
}

// ---------------------------------------------------------------------------
// Unlock policy through the engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_quiz_never_unlocks_next_lesson() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Rust", &[Some(70), None]).await;

    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    for score in [0, 30, 69] {
        fx.engine
            .on_quiz_submitted(USER, lessons[0].id, submission(score))
            .await
            .unwrap();
    }

    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(states(&views), vec![LessonState::Unlocked, LessonState::Locked]);
    assert_matches!(
        fx.engine.record_access(USER, lessons[1].id).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );
    assert_eq!(fx.recorder.count().await, 0);
}

#[tokio::test]
async fn video_alone_does_not_complete_quiz_lesson() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Rust", &[Some(70), None]).await;

    let update = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert!(update.progress.video_watched);
    assert!(!update.progress.completed);

    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(views[1].state, LessonState::Locked);
}

#[tokio::test]
async fn access_follows_unlock_policy() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[None, None]).await;

    let first = fx.engine.record_access(USER, lessons[0].id).await.unwrap();
    assert!(!first.completed);
    assert_matches!(
        fx.engine.record_access(USER, lessons[1].id).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );

    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert!(fx.engine.record_access(USER, lessons[1].id).await.is_ok());
}

#[tokio::test]
async fn lesson_states_read_the_catalog_once() {
    let fx = Fixture::new();
    let (course, _) = fx.seed_course("Rust", &[None, Some(70), None]).await;

    let before = fx.store.lesson_list_reads();
    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(views.len(), 3);
    assert_eq!(fx.store.lesson_list_reads() - before, 1);
}

#[tokio::test]
async fn learners_are_isolated() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Rust", &[None, None]).await;

    fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();

    let other = fx.engine.lesson_states(USER + 1, course.id).await.unwrap();
    assert_eq!(states(&other), vec![LessonState::Unlocked, LessonState::Locked]);
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replayed_events_keep_first_timestamps() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[Some(50), None]).await;
    let lesson = lessons[0].id;

    let first = fx
        .engine
        .on_quiz_submitted(USER, lesson, submission(80))
        .await
        .unwrap()
        .progress
        .unwrap();
    let video = fx.engine.on_video_ended(USER, lesson).await.unwrap().progress;
    let second = fx
        .engine
        .on_quiz_submitted(USER, lesson, submission(95))
        .await
        .unwrap()
        .progress
        .unwrap();

    assert_eq!(first.video_watched_at, video.video_watched_at);
    assert_eq!(first.completed_at, second.completed_at);
    assert_eq!(first.quiz_completed_at, second.quiz_completed_at);
    assert!(video.completed, "a later video event never clears completion");
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completion_read_failure_fails_closed_then_recovers() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[None]).await;

    fx.store.set_fail_completion_reads(true);
    let update = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert!(update.progress.completed);
    assert_matches!(update.completion, CompletionOutcome::NotCompleted);
    assert_eq!(fx.recorder.count().await, 0);

    // The next redelivery finds the course complete and claims it.
    fx.store.set_fail_completion_reads(false);
    let update = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert_matches!(update.completion, CompletionOutcome::Claimed { .. });
    assert_eq!(fx.recorder.count().await, 1);
}

#[tokio::test]
async fn gate_failure_is_an_error_and_sends_nothing() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[None]).await;

    fx.store.set_fail_claims(true);
    assert_matches!(
        fx.engine.on_video_ended(USER, lessons[0].id).await,
        Err(EngineError::Gate(_))
    );
    assert_eq!(fx.recorder.count().await, 0);

    fx.store.set_fail_claims(false);
    let update = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert!(update.completion.is_claimed());
    assert_eq!(fx.recorder.count().await, 1);
}

#[tokio::test]
async fn store_outage_surfaces_as_store_error() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[None]).await;

    fx.store.set_unavailable(true);
    assert_matches!(
        fx.engine.on_video_ended(USER, lessons[0].id).await,
        Err(EngineError::Store(_))
    );
}

#[tokio::test]
async fn abandoned_winner_still_delivers_notice() {
    let slow = Arc::new(SlowChannel::new(Duration::from_millis(200)));
    let fx = Fixture::with_channels(vec![slow.clone() as Arc<dyn NotificationChannel>]);
    let (course, lessons) = fx.seed_course("Rust", &[None]).await;

    // The caller gives up after the claim but before the slow channel settles.
    let first = tokio::time::timeout(
        Duration::from_millis(50),
        fx.engine.on_video_ended(USER, lessons[0].id),
    )
    .await;
    assert!(first.is_err(), "first call should have been abandoned");

    let retry = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();
    assert_matches!(retry.completion, CompletionOutcome::AlreadyClaimed);
    let phase = fx.engine.phase_progress(USER, course.id).await.unwrap();
    assert!(phase.phase1_completed_at.is_some());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(slow.count().await, 1);
    assert_eq!(fx.recorder.count().await, 1);
}

#[tokio::test]
async fn failing_channel_does_not_block_others() {
    let fx = Fixture::with_channels(vec![Arc::new(FailingChannel) as Arc<dyn NotificationChannel>]);
    let (_, lessons) = fx.seed_course("Rust", &[None]).await;

    let update = fx.engine.on_video_ended(USER, lessons[0].id).await.unwrap();

    let CompletionOutcome::Claimed { notifications, .. } = &update.completion else {
        panic!("expected a claimed completion, got {:?}", update.completion);
    };
    assert_matches!(notifications.outcome("failing"), Some(ChannelOutcome::Failed(_)));
    assert_eq!(notifications.outcome("recording"), Some(&ChannelOutcome::Delivered));
    assert_eq!(fx.recorder.count().await, 1);
}

// ---------------------------------------------------------------------------
// Edge cases and validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_course_is_never_completed() {
    let fx = Fixture::new();
    let (course, _) = fx.seed_course("Empty", &[]).await;

    assert!(!fx.engine.is_course_fully_completed(USER, course.id).await);
    assert_matches!(
        fx.engine.evaluate_completion(USER, course.id).await.unwrap(),
        CompletionOutcome::NotCompleted
    );
    assert!(fx.engine.lesson_states(USER, course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn quiz_submission_is_validated() {
    let fx = Fixture::new();
    let (_, lessons) = fx.seed_course("Rust", &[Some(70), None]).await;

    assert_matches!(
        fx.engine
            .on_quiz_submitted(USER, lessons[0].id, submission(101))
            .await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        fx.engine
            .on_quiz_submitted(USER, lessons[1].id, submission(80))
            .await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        fx.engine.on_quiz_submitted(USER, 9_999, submission(80)).await,
        Err(EngineError::Core(CoreError::NotFound { entity: "Lesson", .. }))
    );

    let wrong_quiz = QuizSubmission {
        quiz_id: Some(9_999),
        ..submission(80)
    };
    assert_matches!(
        fx.engine
            .on_quiz_submitted(USER, lessons[0].id, wrong_quiz)
            .await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );

    // Rejected submissions are not logged.
    let log = fx.engine.quiz_attempts(USER, lessons[0].id).await.unwrap();
    assert!(log.attempts.is_empty());
}

#[tokio::test]
async fn reported_pass_below_threshold_is_rejected() {
    let fx = Fixture::new();
    let (course, lessons) = fx.seed_course("Rust", &[Some(70), None]).await;

    let inflated = QuizSubmission {
        passed: Some(true),
        ..submission(10)
    };
    assert_matches!(
        fx.engine
            .on_quiz_submitted(USER, lessons[0].id, inflated)
            .await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );

    let views = fx.engine.lesson_states(USER, course.id).await.unwrap();
    assert_eq!(states(&views), vec![LessonState::Unlocked, LessonState::Locked]);
    let log = fx.engine.quiz_attempts(USER, lessons[0].id).await.unwrap();
    assert!(log.attempts.is_empty());

    // A report that agrees with the score is accepted.
    let consistent = QuizSubmission {
        passed: Some(true),
        ..submission(85)
    };
    let result = fx
        .engine
        .on_quiz_submitted(USER, lessons[0].id, consistent)
        .await
        .unwrap();
    assert!(result.attempt.passed);
    assert_eq!(result.progress.map(|p| p.completed), Some(true));
}

#[tokio::test]
async fn attempt_limit_is_reported_not_enforced() {
    let fx = Fixture::new();
    let course = fx.store.add_course("Rust").await;
    let lesson = fx.store.add_lesson(course.id, "Quiz", 1).await;
    fx.store.add_quiz(lesson.id, 70, Some(2)).await;

    let first = fx
        .engine
        .on_quiz_submitted(USER, lesson.id, submission(10))
        .await
        .unwrap();
    assert_eq!(first.attempts_remaining, Some(1));

    fx.engine
        .on_quiz_submitted(USER, lesson.id, submission(20))
        .await
        .unwrap();
    let third = fx
        .engine
        .on_quiz_submitted(USER, lesson.id, submission(80))
        .await
        .unwrap();
    assert_eq!(third.attempts_used, 3);
    assert_eq!(third.attempts_remaining, Some(0));
    assert!(third.completion.is_claimed());
}
