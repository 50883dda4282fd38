//! Writes each notice as one structured `tracing` line.

use async_trait::async_trait;
use lectern_core::channels::CHANNEL_LOG;

use crate::dispatcher::{ChannelError, NotificationChannel};
use crate::notice::CompletionNotice;

#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        CHANNEL_LOG
    }

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError> {
        tracing::info!(
            user_id = notice.user_id,
            course_id = notice.course_id,
            course_title = %notice.course_title,
            completed_at = %notice.completed_at,
            "Phase 1 completed"
        );
        Ok(())
    }
}
