//! Observable session state.
//!
//! [`SessionState`] is what the view layer renders. The session owns it
//! behind a mutex and hands out clones through
//! [`CommunicationSession::snapshot`](crate::session::CommunicationSession::snapshot).

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use artac_shared::types::{Channel, ChannelId, Memo, Message, MessageId, User, UserId};

/// Where the session's data currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// `initialize` has not completed yet; only cached data is shown.
    #[default]
    Uninitialized,
    /// Data sourced from the backend.
    Online,
    /// Backend unreachable; fallback dataset plus cache.
    Offline,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub mode: SessionMode,
    pub current_user: Option<User>,
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    /// Ordered message sequence per channel.
    pub messages: HashMap<ChannelId, Vec<Message>>,
    pub memos: Vec<Memo>,
    /// Outstanding agent responses per channel.
    pub typing: BTreeMap<ChannelId, usize>,
    pub active_channel: Option<ChannelId>,
}

impl SessionState {
    /// Whether the "offline" indicator should be shown.
    pub fn is_offline(&self) -> bool {
        self.mode == SessionMode::Offline
    }

    pub fn current_user_id(&self) -> Option<&UserId> {
        self.current_user.as_ref().map(|u| &u.id)
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| &c.id == id)
    }

    pub fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| &c.id == id)
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn messages(&self, channel_id: &ChannelId) -> &[Message] {
        self.messages
            .get(channel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn message(&self, channel_id: &ChannelId, message_id: &MessageId) -> Option<&Message> {
        self.messages(channel_id).iter().find(|m| &m.id == message_id)
    }

    pub fn is_typing(&self, channel_id: &ChannelId) -> bool {
        self.typing.get(channel_id).is_some_and(|n| *n > 0)
    }

    pub fn total_unread(&self) -> u32 {
        self.channels.iter().map(|c| c.unread_count).sum()
    }

    pub(crate) fn message_mut(
        &mut self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Option<&mut Message> {
        self.messages
            .get_mut(channel_id)?
            .iter_mut()
            .find(|m| &m.id == message_id)
    }

    pub(crate) fn begin_typing(&mut self, channel_id: &ChannelId) {
        *self.typing.entry(channel_id.clone()).or_default() += 1;
    }

    /// Returns `true` when the indicator for the channel went from on to off.
    pub(crate) fn end_typing(&mut self, channel_id: &ChannelId) -> bool {
        match self.typing.get_mut(channel_id) {
            Some(n) if *n > 1 => {
                *n -= 1;
                false
            }
            Some(_) => {
                self.typing.remove(channel_id);
                true
            }
            None => false,
        }
    }

    /// Make sure the current user appears in the user list.
    pub(crate) fn ensure_current_user_listed(&mut self) {
        if let Some(me) = self.current_user.clone() {
            if self.user(&me.id).is_none() {
                self.users.insert(0, me);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_counts_overlapping_requests() {
        let mut state = SessionState::default();
        let ceo = ChannelId::from("ceo-direct");

        state.begin_typing(&ceo);
        state.begin_typing(&ceo);
        assert!(state.is_typing(&ceo));

        assert!(!state.end_typing(&ceo));
        assert!(state.is_typing(&ceo));
        assert!(state.end_typing(&ceo));
        assert!(!state.is_typing(&ceo));
        assert!(!state.end_typing(&ceo));
    }

    #[test]
    fn test_unknown_channel_has_no_messages() {
        let state = SessionState::default();
        assert!(state.messages(&ChannelId::from("void")).is_empty());
        assert!(!state.is_offline());
    }
}
