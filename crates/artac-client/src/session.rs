//! The communication session: channels, messages, users and memos visible
//! to the dashboard, reconciled between optimistic local writes, the backend
//! and the local message cache.
//!
//! A session starts [`SessionMode::Uninitialized`]. [`CommunicationSession::initialize`]
//! restores the cache, then tries the backend within the startup timeout and
//! lands in [`SessionMode::Online`] or [`SessionMode::Offline`]. The health
//! loop started by [`CommunicationSession::start_health_checks`] moves
//! between the two for the rest of the session's life.
//!
//! No operation here returns an error. Remote failures degrade to cached or
//! fallback data and are logged; operations on a missing user, channel or
//! message are no-ops.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use artac_shared::constants::{CEO_AGENT_ID, MAX_SEARCH_RESULTS};
use artac_shared::protocol::{AgentDto, CeoChatRequest, ChannelDto, SendMessageRequest};
use artac_shared::types::{
    Channel, ChannelId, ChannelKind, Memo, MemoId, MemoPriority, Message, MessageId,
    PresenceStatus, User, UserId,
};
use artac_store::Database;

use crate::ceo;
use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::events::{emit_event, SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::fallback::{fallback_dataset, is_seed_message};
use crate::health::HealthMonitor;
use crate::merge::merge_messages;
use crate::remote::RemoteService;
use crate::state::{SessionMode, SessionState};

/// Role label given to the local user.
const LOCAL_USER_ROLE: &str = "Administrator";

/// Handle to a communication session. Cheap to clone; all clones share state.
///
/// Inject it into the view layer; views read [`snapshot`](Self::snapshot)
/// and listen on [`subscribe`](Self::subscribe).
pub struct CommunicationSession<R: RemoteService> {
    inner: Arc<Inner<R>>,
}

impl<R: RemoteService> Clone for CommunicationSession<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<R> {
    config: ClientConfig,
    remote: R,
    cache: Option<Mutex<Database>>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    health: Mutex<Option<HealthMonitor>>,
}

/// Everything fetched from the backend in one bootstrap.
struct RemoteSnapshot {
    agents: Vec<AgentDto>,
    channels: Vec<ChannelDto>,
    /// Only channels whose message fetch succeeded.
    messages: HashMap<ChannelId, Vec<Message>>,
}

/// The optimistic copy of a sent message plus the background delivery task.
///
/// Dropping it detaches the task; delivery and any agent reply still happen.
pub struct PendingSend {
    pub message: Message,
    task: JoinHandle<()>,
}

impl PendingSend {
    /// Wait until delivery and any agent reply (real or canned) have settled.
    pub async fn settled(self) {
        if let Err(e) = self.task.await {
            warn!(message = %self.message.id, error = %e, "delivery task failed");
        }
    }
}

impl<R: RemoteService> CommunicationSession<R> {
    /// Create an uninitialized session. `cache` may be `None`; the session then
    /// runs without page-reload continuity.
    pub fn new(config: ClientConfig, remote: R, cache: Option<Database>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                remote,
                cache: cache.map(Mutex::new),
                state: Mutex::new(SessionState::default()),
                events,
                health: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Clone of the current state for rendering.
    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub fn mode(&self) -> SessionMode {
        self.state().mode
    }

    pub fn is_offline(&self) -> bool {
        self.state().is_offline()
    }

    pub fn messages(&self, channel_id: &ChannelId) -> Vec<Message> {
        self.state().messages(channel_id).to_vec()
    }

    pub fn is_typing(&self, channel_id: &ChannelId) -> bool {
        self.state().is_typing(channel_id)
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Bring the session up.
    ///
    /// Cached channel lists are placed in state before any network call
    /// resolves. The backend bootstrap is then bounded by
    /// [`ClientConfig::startup_timeout`]; on any failure the fallback dataset
    /// is loaded and the offline indicator set.
    pub async fn initialize(&self) -> SessionMode {
        let cached = self.cached_all();
        let restored = cached.len();
        {
            let mut st = self.state();
            st.current_user = Some(self.local_user());
            st.ensure_current_user_listed();
            for (channel_id, list) in cached {
                st.messages.insert(channel_id, list);
            }
        }
        if restored > 0 {
            info!(channels = restored, "restored cached messages");
            self.emit(SessionEvent::CacheRestored { channels: restored });
        }

        match self.fetch_remote(self.inner.config.startup_timeout).await {
            Ok(snapshot) => self.apply_online(snapshot),
            Err(e) => {
                warn!(error = %e, "backend unreachable at startup, using offline dataset");
                self.apply_offline();
            }
        }

        self.mode()
    }

    async fn fetch_remote(&self, limit: Duration) -> Result<RemoteSnapshot, RemoteError> {
        match tokio::time::timeout(limit, self.fetch_remote_unbounded()).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(limit)),
        }
    }

    async fn fetch_remote_unbounded(&self) -> Result<RemoteSnapshot, RemoteError> {
        let remote = &self.inner.remote;
        let (agents, channels) = futures::try_join!(remote.fetch_agents(), remote.fetch_channels())?;

        let ids: Vec<ChannelId> = channels.iter().map(|c| ChannelId::new(c.id.clone())).collect();
        let results =
            futures::future::join_all(ids.iter().map(|id| remote.fetch_messages(id))).await;

        let mut messages = HashMap::new();
        for (channel_id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(list) => {
                    messages.insert(channel_id, list.into_iter().map(Message::from).collect());
                }
                Err(e) => {
                    warn!(channel = %channel_id, error = %e, "channel fetch failed, keeping local copy");
                }
            }
        }

        Ok(RemoteSnapshot {
            agents,
            channels,
            messages,
        })
    }

    fn apply_online(&self, snapshot: RemoteSnapshot) {
        let RemoteSnapshot {
            agents,
            channels,
            mut messages,
        } = snapshot;
        let channels: Vec<Channel> = channels.into_iter().map(Channel::from).collect();

        let previous = {
            let mut st = self.state();
            let mut merged = HashMap::new();
            for channel in &channels {
                let local = local_history(&st, &channel.id);
                let list = match messages.remove(&channel.id) {
                    Some(remote) => {
                        let list = merge_messages(remote, local);
                        self.persist(&channel.id, &list);
                        list
                    }
                    None => local,
                };
                merged.insert(channel.id.clone(), list);
            }

            let local_only = locally_created_channels(&st, &channels);
            for c in &local_only {
                merged.insert(c.id.clone(), st.messages(&c.id).to_vec());
            }
            st.users = agents.into_iter().map(User::from).collect();
            st.ensure_current_user_listed();
            st.channels = channels;
            st.channels.extend(local_only);
            st.messages = merged;
            std::mem::replace(&mut st.mode, SessionMode::Online)
        };

        info!(previous = ?previous, "session online");
        self.announce_reload(previous, SessionMode::Online);
    }

    fn apply_offline(&self) {
        let data = fallback_dataset();

        let previous = {
            let mut st = self.state();
            let mut merged = HashMap::new();
            for channel in &data.channels {
                let seed = data.messages.get(&channel.id).cloned().unwrap_or_default();
                merged.insert(channel.id.clone(), merge_messages(seed, local_history(&st, &channel.id)));
            }

            let local_only = locally_created_channels(&st, &data.channels);
            for c in &local_only {
                merged.insert(c.id.clone(), st.messages(&c.id).to_vec());
            }
            st.users = data.users;
            st.ensure_current_user_listed();
            st.channels = data.channels;
            st.channels.extend(local_only);
            st.messages = merged;
            std::mem::replace(&mut st.mode, SessionMode::Offline)
        };

        info!(previous = ?previous, "session offline");
        self.announce_reload(previous, SessionMode::Offline);
    }

    fn announce_reload(&self, previous: SessionMode, mode: SessionMode) {
        if previous != mode {
            self.emit(SessionEvent::ModeChanged { mode });
        }
        self.emit(SessionEvent::UsersChanged);
        self.emit(SessionEvent::ChannelsChanged);
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Send a message.
    ///
    /// The message is appended to the channel and written to the cache before
    /// this returns; delivery to the backend and any CEO reply run on a
    /// spawned task. Returns `None` without side effects when there is no
    /// current user, the channel is unknown or the content is blank.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send(
        &self,
        channel_id: &ChannelId,
        content: &str,
        mentions: Vec<String>,
        reply_to: Option<MessageId>,
    ) -> Option<PendingSend> {
        if content.trim().is_empty() {
            return None;
        }

        let (message, is_ceo, mode) = {
            let mut st = self.state();
            let Some(author) = st.current_user_id().cloned() else {
                debug!(channel = %channel_id, "send ignored, no current user");
                return None;
            };
            if st.channel(channel_id).is_none() {
                debug!(channel = %channel_id, "send ignored, unknown channel");
                return None;
            }

            let mut message = Message::new(channel_id.clone(), author, content);
            message.mentions = mentions;
            message.reply_to = reply_to;

            let is_ceo = ceo::is_ceo_channel(
                &self.inner.config.ceo_channel_id,
                channel_id,
                &message.mentions,
                &message.content,
            );

            st.messages
                .entry(channel_id.clone())
                .or_default()
                .push(message.clone());
            self.persist(channel_id, st.messages(channel_id));

            if is_ceo {
                st.begin_typing(channel_id);
            }
            (message, is_ceo, st.mode)
        };

        self.emit(SessionEvent::MessageAdded {
            channel_id: channel_id.clone(),
            message_id: message.id.clone(),
        });
        if is_ceo {
            self.emit(SessionEvent::TypingChanged {
                channel_id: channel_id.clone(),
                typing: true,
            });
        }

        let session = self.clone();
        let outgoing = message.clone();
        let task = tokio::spawn(async move { session.deliver(outgoing, is_ceo, mode).await });

        Some(PendingSend { message, task })
    }

    async fn deliver(&self, message: Message, is_ceo: bool, mode: SessionMode) {
        let post = async {
            let body = SendMessageRequest::from(&message);
            match self.inner.remote.post_message(&message.channel_id, &body).await {
                Ok(()) => debug!(channel = %message.channel_id, message = %message.id, "message delivered"),
                Err(e) => debug!(
                    channel = %message.channel_id,
                    message = %message.id,
                    error = %e,
                    "message not delivered, local copy kept"
                ),
            }
        };

        if is_ceo {
            tokio::join!(post, self.ceo_reply(&message, mode));
        } else {
            post.await;
        }
    }

    async fn ceo_reply(&self, prompt: &Message, mode: SessionMode) {
        let channel_id = &prompt.channel_id;
        let (responder, role) = self.ceo_responder();
        let canned = || ceo::canned_response(&role, &prompt.content).to_string();

        if mode == SessionMode::Offline {
            tokio::time::sleep(self.inner.config.offline_response_delay).await;
            self.append_agent_reply(channel_id, &responder, canned(), true);
            return;
        }

        tokio::time::sleep(self.inner.config.ceo_response_delay).await;
        let request = CeoChatRequest {
            message: prompt.content.clone(),
            user_id: prompt.user_id.to_string(),
        };
        match self.inner.remote.ceo_chat(&request).await {
            Ok(response) => {
                self.append_agent_reply(channel_id, &responder, response.message, true);
            }
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "CEO agent unavailable, using canned reply");
                self.stop_typing(channel_id);
                tokio::time::sleep(self.inner.config.offline_response_delay).await;
                self.append_agent_reply(channel_id, &responder, canned(), false);
            }
        }
    }

    /// The CEO agent as currently listed, or the well-known default.
    fn ceo_responder(&self) -> (UserId, String) {
        let st = self.state();
        let listed = st
            .users
            .iter()
            .find(|u| u.role.eq_ignore_ascii_case("ceo"))
            .map(|u| (u.id.clone(), u.role.clone()));
        listed.unwrap_or_else(|| (UserId::from(CEO_AGENT_ID), "CEO".to_string()))
    }

    fn append_agent_reply(
        &self,
        channel_id: &ChannelId,
        author: &UserId,
        content: String,
        ends_typing: bool,
    ) {
        let reply = Message::new(channel_id.clone(), author.clone(), content);

        let (appended, typing_off) = {
            let mut st = self.state();
            let typing_off = ends_typing && st.end_typing(channel_id);
            let appended = st.channel(channel_id).is_some();
            if appended {
                let active = st.active_channel.as_ref() == Some(channel_id);
                st.messages
                    .entry(channel_id.clone())
                    .or_default()
                    .push(reply.clone());
                if !active {
                    if let Some(channel) = st.channel_mut(channel_id) {
                        channel.unread_count += 1;
                    }
                }
                self.persist(channel_id, st.messages(channel_id));
            }
            (appended, typing_off)
        };

        if appended {
            self.emit(SessionEvent::MessageAdded {
                channel_id: channel_id.clone(),
                message_id: reply.id,
            });
        } else {
            debug!(channel = %channel_id, "reply dropped, channel no longer listed");
        }
        if typing_off {
            self.emit(SessionEvent::TypingChanged {
                channel_id: channel_id.clone(),
                typing: false,
            });
        }
    }

    fn stop_typing(&self, channel_id: &ChannelId) {
        let typing_off = self.state().end_typing(channel_id);
        if typing_off {
            self.emit(SessionEvent::TypingChanged {
                channel_id: channel_id.clone(),
                typing: false,
            });
        }
    }

    // ------------------------------------------------------------------
    // Message actions (client-local)
    // ------------------------------------------------------------------

    /// Add or remove the current user's `emoji` reaction.
    pub fn toggle_reaction(&self, channel_id: &ChannelId, message_id: &MessageId, emoji: &str) -> bool {
        self.update_message(channel_id, message_id, |message, me| {
            let users = message.reactions.entry(emoji.to_string()).or_default();
            if !users.remove(me) {
                users.insert(me.clone());
            }
            if users.is_empty() {
                message.reactions.remove(emoji);
            }
            true
        })
    }

    pub fn toggle_pin(&self, channel_id: &ChannelId, message_id: &MessageId) -> bool {
        self.update_message(channel_id, message_id, |message, _| {
            message.pinned = !message.pinned;
            true
        })
    }

    pub fn edit_message(&self, channel_id: &ChannelId, message_id: &MessageId, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        self.update_message(channel_id, message_id, |message, _| {
            if message.content == content {
                return false;
            }
            message.content = content.to_string();
            message.edited_at = Some(Utc::now());
            true
        })
    }

    /// Remove a message from its channel. Other channels are untouched.
    pub fn delete_message(&self, channel_id: &ChannelId, message_id: &MessageId) -> bool {
        {
            let mut st = self.state();
            if st.current_user.is_none() {
                return false;
            }
            let Some(list) = st.messages.get_mut(channel_id) else {
                return false;
            };
            let before = list.len();
            list.retain(|m| &m.id != message_id);
            if list.len() == before {
                return false;
            }
            self.persist(channel_id, list);
        }

        self.emit(SessionEvent::MessageRemoved {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
        });
        true
    }

    fn update_message<F>(&self, channel_id: &ChannelId, message_id: &MessageId, f: F) -> bool
    where
        F: FnOnce(&mut Message, &UserId) -> bool,
    {
        {
            let mut st = self.state();
            let Some(me) = st.current_user_id().cloned() else {
                return false;
            };
            let Some(message) = st.message_mut(channel_id, message_id) else {
                return false;
            };
            if !f(message, &me) {
                return false;
            }
            self.persist(channel_id, st.messages(channel_id));
        }

        self.emit(SessionEvent::MessageUpdated {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
        });
        true
    }

    /// Case-insensitive substring search, newest first.
    pub fn search_messages(&self, query: &str, channel_id: Option<&ChannelId>) -> Vec<Message> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let st = self.state();
        let mut results: Vec<Message> = st
            .messages
            .iter()
            .filter(|(id, _)| channel_id.map_or(true, |wanted| *id == wanted))
            .flat_map(|(_, list)| list.iter())
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        results.truncate(MAX_SEARCH_RESULTS);
        results
    }

    /// Re-fetch one channel from the backend and merge it with the local copy.
    pub async fn refresh_channel(&self, channel_id: &ChannelId) -> bool {
        let known = self.state().channel(channel_id).is_some();
        if !known {
            return false;
        }

        let limit = self.inner.config.startup_timeout;
        let remote = match tokio::time::timeout(limit, self.inner.remote.fetch_messages(channel_id)).await {
            Ok(Ok(list)) => list.into_iter().map(Message::from).collect::<Vec<_>>(),
            Ok(Err(e)) => {
                warn!(channel = %channel_id, error = %e, "channel refresh failed");
                return false;
            }
            Err(_) => {
                warn!(channel = %channel_id, "channel refresh timed out");
                return false;
            }
        };

        {
            let mut st = self.state();
            let merged = merge_messages(remote, local_history(&st, channel_id));
            self.persist(channel_id, &merged);
            st.messages.insert(channel_id.clone(), merged);
        }
        self.emit(SessionEvent::MessagesReplaced {
            channel_id: channel_id.clone(),
        });
        true
    }

    // ------------------------------------------------------------------
    // Channels & presence
    // ------------------------------------------------------------------

    /// Create a channel owned by the current user, who is always a member.
    pub fn create_channel(
        &self,
        name: &str,
        description: Option<&str>,
        kind: ChannelKind,
        members: Vec<UserId>,
    ) -> Option<Channel> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let channel = {
            let mut st = self.state();
            let me = st.current_user_id().cloned()?;
            let mut members: BTreeSet<UserId> = members.into_iter().collect();
            members.insert(me.clone());

            let channel = Channel {
                id: ChannelId::generate(),
                name: name.to_string(),
                description: description
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
                kind,
                members,
                created_by: me,
                created_at: Utc::now(),
                unread_count: 0,
            };
            st.channels.push(channel.clone());
            st.messages.entry(channel.id.clone()).or_default();
            channel
        };

        info!(channel = %channel.id, name = %channel.name, "channel created");
        self.emit(SessionEvent::ChannelsChanged);
        Some(channel)
    }

    pub fn join_channel(&self, channel_id: &ChannelId) -> bool {
        self.update_membership(channel_id, true)
    }

    pub fn leave_channel(&self, channel_id: &ChannelId) -> bool {
        self.update_membership(channel_id, false)
    }

    fn update_membership(&self, channel_id: &ChannelId, join: bool) -> bool {
        let changed = {
            let mut st = self.state();
            let Some(me) = st.current_user_id().cloned() else {
                return false;
            };
            let Some(channel) = st.channel_mut(channel_id) else {
                return false;
            };
            if join {
                channel.members.insert(me)
            } else {
                channel.members.remove(&me)
            }
        };
        if changed {
            self.emit(SessionEvent::ChannelsChanged);
        }
        changed
    }

    /// Select the channel being viewed; selecting marks it read.
    pub fn set_active_channel(&self, channel_id: Option<&ChannelId>) -> bool {
        {
            let mut st = self.state();
            if let Some(id) = channel_id {
                if st.channel(id).is_none() {
                    return false;
                }
            }
            st.active_channel = channel_id.cloned();
        }
        if let Some(id) = channel_id {
            self.mark_channel_read(id);
        }
        true
    }

    /// Reset a channel's unread counter. Returns `true` if it was non-zero.
    pub fn mark_channel_read(&self, channel_id: &ChannelId) -> bool {
        let changed = {
            let mut st = self.state();
            match st.channel_mut(channel_id) {
                Some(channel) if channel.unread_count > 0 => {
                    channel.unread_count = 0;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.emit(SessionEvent::ChannelsChanged);
        }
        changed
    }

    pub fn set_presence(&self, user_id: &UserId, status: PresenceStatus) -> bool {
        let changed = {
            let mut st = self.state();
            let mut changed = false;
            if let Some(user) = st.users.iter_mut().find(|u| &u.id == user_id) {
                changed = user.status != status;
                user.status = status;
            }
            if let Some(me) = st.current_user.as_mut().filter(|me| &me.id == user_id) {
                me.status = status;
            }
            changed
        };
        if changed {
            self.emit(SessionEvent::PresenceChanged {
                user_id: user_id.clone(),
            });
        }
        changed
    }

    // ------------------------------------------------------------------
    // Memos
    // ------------------------------------------------------------------

    pub fn create_memo(
        &self,
        title: &str,
        content: &str,
        recipients: Vec<UserId>,
        priority: MemoPriority,
        tags: Vec<String>,
    ) -> Option<Memo> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let memo = {
            let mut st = self.state();
            let author = st.current_user_id().cloned()?;
            let memo = Memo {
                id: MemoId::generate(),
                title: title.to_string(),
                content: content.to_string(),
                read_by: BTreeSet::from([author.clone()]),
                author,
                recipients,
                priority,
                tags,
                created_at: Utc::now(),
            };
            st.memos.push(memo.clone());
            memo
        };

        self.emit(SessionEvent::MemosChanged);
        Some(memo)
    }

    pub fn mark_memo_read(&self, memo_id: &MemoId) -> bool {
        let changed = {
            let mut st = self.state();
            let Some(me) = st.current_user_id().cloned() else {
                return false;
            };
            match st.memos.iter_mut().find(|m| &m.id == memo_id) {
                Some(memo) => memo.read_by.insert(me),
                None => false,
            }
        };
        if changed {
            self.emit(SessionEvent::MemosChanged);
        }
        changed
    }

    pub fn delete_memo(&self, memo_id: &MemoId) -> bool {
        let removed = {
            let mut st = self.state();
            let before = st.memos.len();
            st.memos.retain(|m| &m.id != memo_id);
            st.memos.len() != before
        };
        if removed {
            self.emit(SessionEvent::MemosChanged);
        }
        removed
    }

    /// Memos addressed to the current user that they have not read, newest first.
    pub fn unread_memos(&self) -> Vec<Memo> {
        let st = self.state();
        let Some(me) = st.current_user_id() else {
            return Vec::new();
        };
        let mut memos: Vec<Memo> = st
            .memos
            .iter()
            .filter(|m| m.is_addressed_to(me) && !m.is_read_by(me))
            .cloned()
            .collect();
        memos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        memos
    }

    // ------------------------------------------------------------------
    // Health reconciliation
    // ------------------------------------------------------------------

    /// Start the periodic health check. Replaces (and cancels) a running one.
    ///
    /// The task keeps only a weak reference to the session, so it ends on its
    /// own once every handle is dropped.
    pub fn start_health_checks(&self) {
        let weak: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        let monitor = HealthMonitor::spawn(self.inner.config.health_interval, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                CommunicationSession { inner }.check_health().await;
                true
            }
        });

        let previous = self
            .inner
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(monitor);
        if previous.is_some() {
            debug!("replaced running health monitor");
        }
    }

    pub fn health_checks_running(&self) -> bool {
        self.inner
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(HealthMonitor::is_running)
    }

    /// One health reconciliation step.
    ///
    /// Offline and reachable: full re-fetch, then online. Online and
    /// unreachable: fallback dataset, then offline. Returns the resulting mode.
    pub async fn check_health(&self) -> SessionMode {
        let limit = self.inner.config.startup_timeout;
        let reachable = matches!(
            tokio::time::timeout(limit, self.inner.remote.health()).await,
            Ok(Ok(()))
        );

        let mode = self.mode();
        match (mode, reachable) {
            (SessionMode::Offline, true) => {
                info!("backend reachable again, re-fetching");
                match self.fetch_remote(limit).await {
                    Ok(snapshot) => self.apply_online(snapshot),
                    Err(e) => warn!(error = %e, "re-fetch failed, staying offline"),
                }
            }
            (SessionMode::Online, false) => {
                warn!("backend unreachable, switching to offline dataset");
                self.apply_offline();
            }
            _ => debug!(mode = ?mode, reachable, "health check"),
        }

        self.mode()
    }

    /// Tear the session down: stops the health loop. In-flight sends finish
    /// on their own.
    pub async fn shutdown(&self) {
        let monitor = self
            .inner
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(monitor) = monitor {
            monitor.stop().await;
            info!("health checks stopped");
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        emit_event(&self.inner.events, event);
    }

    fn local_user(&self) -> User {
        let config = &self.inner.config;
        User {
            id: config.user_id.clone(),
            name: config.user_name.clone(),
            role: LOCAL_USER_ROLE.to_string(),
            status: PresenceStatus::Online,
            avatar: config
                .user_name
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string()),
        }
    }

    /// Run `f` against the cache. Any failure is logged and reported as `None`.
    fn with_cache<T>(&self, f: impl FnOnce(&Database) -> artac_store::Result<T>) -> Option<T> {
        let cache = self.inner.cache.as_ref()?;
        let db = cache.lock().unwrap_or_else(PoisonError::into_inner);
        match f(&db) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "message cache unavailable");
                None
            }
        }
    }

    /// Write a channel's history to the cache, leaving out seed messages.
    ///
    /// Callers hold the state lock so that writes reach the cache in the
    /// order they were made to state. The cache lock is always taken second.
    fn persist(&self, channel_id: &ChannelId, messages: &[Message]) {
        if self.inner.cache.is_none() {
            return;
        }
        let history: Vec<Message> = messages
            .iter()
            .filter(|m| !is_seed_message(m))
            .cloned()
            .collect();
        self.with_cache(|db| db.save_channel_messages(channel_id, &history));
    }

    fn cached_all(&self) -> HashMap<ChannelId, Vec<Message>> {
        self.with_cache(|db| db.load_all_channel_messages())
            .unwrap_or_default()
    }
}

/// The local side of a merge: the channel's in-memory list without seed
/// messages. State is restored from the cache on startup and every change is
/// written through, so this matches the cached history.
fn local_history(st: &SessionState, channel_id: &ChannelId) -> Vec<Message> {
    st.messages(channel_id)
        .iter()
        .filter(|m| !is_seed_message(m))
        .cloned()
        .collect()
}

/// Channels the current user created that `incoming` does not contain.
fn locally_created_channels(st: &SessionState, incoming: &[Channel]) -> Vec<Channel> {
    let Some(me) = st.current_user_id() else {
        return Vec::new();
    };
    st.channels
        .iter()
        .filter(|c| &c.created_by == me && !incoming.iter().any(|i| i.id == c.id))
        .cloned()
        .collect()
}
