//! In-app channel: republishes the notice on the [`EventBus`].

use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::channels::CHANNEL_IN_APP;

use crate::bus::{EventBus, PlatformEvent};
use crate::dispatcher::{ChannelError, NotificationChannel};
use crate::notice::{CompletionNotice, EVENT_PHASE1_COMPLETED};

pub struct BusChannel {
    bus: Arc<EventBus>,
}

impl BusChannel {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationChannel for BusChannel {
    fn name(&self) -> &str {
        CHANNEL_IN_APP
    }

    async fn send(&self, notice: &CompletionNotice) -> Result<(), ChannelError> {
        let event = PlatformEvent::new(EVENT_PHASE1_COMPLETED)
            .with_source("course", notice.course_id)
            .with_actor(notice.user_id)
            .with_payload(serde_json::to_value(notice)?);

        let receivers = self.bus.publish(event);
        tracing::debug!(receivers, course_id = notice.course_id, "Completion event published");
        Ok(())
    }
}
