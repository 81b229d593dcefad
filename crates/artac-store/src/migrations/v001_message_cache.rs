//! v001 -- Initial schema creation.
//!
//! Creates the `message_cache` table: one row per channel holding the
//! channel's ordered message list as a JSON array.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS message_cache (
    channel_id    TEXT PRIMARY KEY NOT NULL,
    messages_json TEXT NOT NULL,              -- JSON array, ascending by timestamp
    message_count INTEGER NOT NULL DEFAULT 0,
    updated_at    TEXT NOT NULL               -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
