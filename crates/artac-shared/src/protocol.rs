//! JSON payloads exchanged with the ARTAC backend REST API.
//!
//! The DTOs mirror the backend's field names exactly; conversion into the
//! richer domain types happens here so that the client never touches raw
//! wire shapes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    Channel, ChannelId, ChannelKind, Message, MessageId, PresenceStatus, User, UserId,
};

/// Creator recorded for channels that come from the backend's channel list.
pub const SYSTEM_USER_ID: &str = "system";

/// `GET /channels` item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

impl From<ChannelDto> for Channel {
    fn from(dto: ChannelDto) -> Self {
        let kind = dto
            .kind
            .as_deref()
            .and_then(|k| k.parse().ok())
            .unwrap_or(ChannelKind::Public);
        Self {
            id: ChannelId(dto.id),
            name: dto.name,
            description: dto.description.filter(|d| !d.is_empty()),
            kind,
            members: BTreeSet::new(),
            created_by: UserId::from(SYSTEM_USER_ID),
            created_at: dto.created_at,
            unread_count: dto.unread_count,
        }
    }
}

/// `GET /channels/{id}/messages` item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Self {
            id: MessageId(dto.id),
            channel_id: ChannelId(dto.channel_id),
            user_id: UserId(dto.user_id),
            content: dto.content,
            timestamp: dto.timestamp,
            mentions: dto.mentions,
            reply_to: dto.reply_to.map(MessageId),
            reactions: BTreeMap::new(),
            pinned: false,
            edited_at: None,
        }
    }
}

/// `POST /channels/{id}/messages` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub channel_id: String,
    pub content: String,
    pub mentions: Vec<String>,
    pub reply_to: Option<String>,
}

impl From<&Message> for SendMessageRequest {
    fn from(m: &Message) -> Self {
        Self {
            channel_id: m.channel_id.to_string(),
            content: m.content.clone(),
            mentions: m.mentions.clone(),
            reply_to: m.reply_to.as_ref().map(|r| r.to_string()),
        }
    }
}

/// `GET /agents` item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDto {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Identifier of the agent's live session, if one is running.
    #[serde(default)]
    pub claude_session: Option<String>,
}

impl From<AgentDto> for User {
    fn from(dto: AgentDto) -> Self {
        let status = match dto.claude_session.as_deref() {
            Some(s) if !s.is_empty() => PresenceStatus::Online,
            _ => PresenceStatus::Offline,
        };
        let avatar = dto.name.chars().next().map(|c| c.to_uppercase().to_string());
        Self {
            id: UserId(dto.id),
            name: dto.name,
            role: dto.role,
            status,
            avatar,
        }
    }
}

/// `POST /ceo/chat` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeoChatRequest {
    pub message: String,
    pub user_id: String,
}

/// `POST /ceo/chat` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeoChatResponse {
    pub message: String,
}
