use serde::Serialize;
use tokio::sync::broadcast;

use artac_shared::types::{ChannelId, MessageId, UserId};

use crate::state::SessionMode;

/// Capacity of the session event channel. Slow receivers see `Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications pushed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ModeChanged { mode: SessionMode },
    CacheRestored { channels: usize },
    MessageAdded { channel_id: ChannelId, message_id: MessageId },
    MessageUpdated { channel_id: ChannelId, message_id: MessageId },
    MessageRemoved { channel_id: ChannelId, message_id: MessageId },
    MessagesReplaced { channel_id: ChannelId },
    TypingChanged { channel_id: ChannelId, typing: bool },
    PresenceChanged { user_id: UserId },
    ChannelsChanged,
    UsersChanged,
    MemosChanged,
}

pub(crate) fn emit_event(tx: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    // No receivers is normal for headless use.
    if tx.send(event).is_err() {
        tracing::trace!("session event dropped, no subscribers");
    }
}
