//! Fixed dataset shown while the backend is unreachable.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, TimeZone, Utc};

use artac_shared::constants::{CEO_AGENT_ID, DEFAULT_CEO_CHANNEL_ID, DEFAULT_USER_ID, DEFAULT_USER_NAME};
use artac_shared::protocol::SYSTEM_USER_ID;
use artac_shared::types::{
    Channel, ChannelId, ChannelKind, Message, MessageId, PresenceStatus, User, UserId,
};

/// Users, channels and seed messages of the offline dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackDataset {
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    pub messages: HashMap<ChannelId, Vec<Message>>,
}

/// Id prefix shared by every seed message.
const SEED_ID_PREFIX: &str = "fallback-";

/// Whether `message` is an offline seed rather than real history. Seeds are
/// never cached and never merged into online data.
pub fn is_seed_message(message: &Message) -> bool {
    message.id.as_str().starts_with(SEED_ID_PREFIX)
}

/// All fallback timestamps are offsets from this instant (2024-01-15 09:00 UTC).
const EPOCH_SECS: i64 = 1_705_309_200;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_SECS, 0).single().unwrap_or_default() + Duration::minutes(minutes)
}

fn user(id: &str, name: &str, role: &str, status: PresenceStatus, avatar: &str) -> User {
    User {
        id: UserId::from(id),
        name: name.to_string(),
        role: role.to_string(),
        status,
        avatar: Some(avatar.to_string()),
    }
}

fn channel(
    id: &str,
    name: &str,
    description: &str,
    kind: ChannelKind,
    members: &[&str],
    minutes: i64,
) -> Channel {
    Channel {
        id: ChannelId::from(id),
        name: name.to_string(),
        description: Some(description.to_string()),
        kind,
        members: members.iter().map(|m| UserId::from(*m)).collect::<BTreeSet<_>>(),
        created_by: UserId::from(SYSTEM_USER_ID),
        created_at: at(minutes),
        unread_count: 0,
    }
}

fn message(id: &str, channel_id: &str, author: &str, content: &str, minutes: i64) -> Message {
    let mut m = Message::new(ChannelId::from(channel_id), UserId::from(author), content);
    m.id = MessageId::new(format!("{SEED_ID_PREFIX}{id}"));
    m.timestamp = at(minutes);
    m
}

/// Build the offline dataset. Every call returns an identical value.
pub fn fallback_dataset() -> FallbackDataset {
    const CTO: &str = "cto-agent";
    const COO: &str = "coo-agent";
    const DEV: &str = "dev-agent";
    const QA: &str = "qa-agent";

    let users = vec![
        user(DEFAULT_USER_ID, DEFAULT_USER_NAME, "Administrator", PresenceStatus::Online, "A"),
        user(CEO_AGENT_ID, "CEO Agent", "CEO", PresenceStatus::Online, "👔"),
        user(CTO, "CTO Agent", "CTO", PresenceStatus::Busy, "🛠"),
        user(COO, "COO Agent", "COO", PresenceStatus::Away, "📋"),
        user(DEV, "Developer Agent", "Developer", PresenceStatus::Online, "💻"),
        user(QA, "QA Agent", "QA Engineer", PresenceStatus::Offline, "🔍"),
    ];

    let everyone = [DEFAULT_USER_ID, CEO_AGENT_ID, CTO, COO, DEV, QA];

    let channels = vec![
        channel("general", "general", "Company-wide announcements and chat", ChannelKind::Public, &everyone, 0),
        channel(
            DEFAULT_CEO_CHANNEL_ID,
            "CEO",
            "Direct line to the CEO agent",
            ChannelKind::Direct,
            &[DEFAULT_USER_ID, CEO_AGENT_ID],
            1,
        ),
        channel("engineering", "engineering", "Builds, deploys and technical design", ChannelKind::Public, &[DEFAULT_USER_ID, CTO, DEV, QA], 2),
        channel("operations", "operations", "Scheduling and resource planning", ChannelKind::Private, &[DEFAULT_USER_ID, COO, CEO_AGENT_ID], 3),
    ];

    let seed = vec![
        message("general-1", "general", CEO_AGENT_ID, "Welcome to ARTAC Mission Control. All agents report here.", 10),
        message("general-2", "general", COO, "Daily operations summary is posted in #operations.", 25),
        message("ceo-1", DEFAULT_CEO_CHANNEL_ID, CEO_AGENT_ID, "Hello! I'm the CEO agent. What would you like to discuss?", 11),
        message("eng-1", "engineering", CTO, "Reminder: release freeze starts Friday.", 30),
        message("eng-2", "engineering", DEV, "Build pipeline is green on main.", 42),
        message("eng-3", "engineering", QA, "Regression suite scheduled for tonight.", 55),
        message("ops-1", "operations", COO, "Resource allocation for Q1 is under review.", 35),
    ];

    let mut messages: HashMap<ChannelId, Vec<Message>> = channels
        .iter()
        .map(|c| (c.id.clone(), Vec::new()))
        .collect();
    for m in seed {
        messages.entry(m.channel_id.clone()).or_default().push(m);
    }
    for list in messages.values_mut() {
        list.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }

    FallbackDataset {
        users,
        channels,
        messages,
    }
}
