//! # artac-store
//!
//! Local persisted message cache for the ARTAC communication client, backed
//! by SQLite.
//!
//! The cache keeps one entry per channel id holding that channel's ordered
//! message list as JSON. It exists purely for page-reload continuity and
//! offline display; callers are expected to treat every error as "nothing
//! cached".

pub mod database;
pub mod message_cache;
pub mod migrations;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
