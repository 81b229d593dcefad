//! Per-channel message list cache.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use artac_shared::types::{ChannelId, Message};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Replace the cached message list of a channel.
    pub fn save_channel_messages(&self, channel_id: &ChannelId, messages: &[Message]) -> Result<()> {
        let json = serde_json::to_string(messages)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO message_cache (channel_id, messages_json, message_count, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                channel_id.as_str(),
                json,
                messages.len() as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tracing::trace!(channel = %channel_id, count = messages.len(), "channel cache written");
        Ok(())
    }

    /// Load the cached message list of a channel. `None` when nothing is cached.
    pub fn load_channel_messages(&self, channel_id: &ChannelId) -> Result<Option<Vec<Message>>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT messages_json FROM message_cache WHERE channel_id = ?1",
                params![channel_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Load every cached channel. Entries that fail to decode are skipped.
    pub fn load_all_channel_messages(&self) -> Result<HashMap<ChannelId, Vec<Message>>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT channel_id, messages_json FROM message_cache")?;

        let rows = stmt.query_map([], |row| {
            let channel_id: String = row.get(0)?;
            let json: String = row.get(1)?;
            Ok((channel_id, json))
        })?;

        let mut out = HashMap::new();
        for row in rows {
            let (channel_id, json) = row?;
            match serde_json::from_str::<Vec<Message>>(&json) {
                Ok(messages) => {
                    out.insert(ChannelId(channel_id), messages);
                }
                Err(e) => {
                    tracing::warn!(channel = %channel_id, error = %e, "skipping malformed cache entry");
                }
            }
        }
        Ok(out)
    }

    /// Ids of all channels with a cache entry, sorted.
    pub fn cached_channel_ids(&self) -> Result<Vec<ChannelId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT channel_id FROM message_cache ORDER BY channel_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(ChannelId(row?));
        }
        Ok(ids)
    }

    /// Drop a channel's cache entry. Returns `true` if one existed.
    pub fn clear_channel_messages(&self, channel_id: &ChannelId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM message_cache WHERE channel_id = ?1",
            params![channel_id.as_str()],
        )?;
        Ok(affected > 0)
    }
}
