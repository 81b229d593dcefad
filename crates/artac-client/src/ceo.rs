//! Routing of messages to the CEO agent and its offline stand-in replies.

use artac_shared::types::ChannelId;

/// Decide whether a send should be answered by the CEO agent.
///
/// True when any of these hold:
/// - the channel id equals the designated CEO channel id
/// - the channel id contains `"ceo"`
/// - a mention contains `"ceo"`
/// - the content contains `"@ceo"`
///
/// Substring matching also fires for ids such as `"proceeds"`.
pub fn is_ceo_channel(
    designated: &ChannelId,
    channel_id: &ChannelId,
    mentions: &[String],
    content: &str,
) -> bool {
    if channel_id == designated {
        return true;
    }
    if channel_id.as_str().to_lowercase().contains("ceo") {
        return true;
    }
    if mentions.iter().any(|m| m.to_lowercase().contains("ceo")) {
        return true;
    }
    content.to_lowercase().contains("@ceo")
}

const CEO_PHRASES: &[&str] = &[
    "Thanks for the update. I'm reviewing the strategic implications and will follow up shortly.",
    "Good point. Let's align this with our quarterly objectives before we commit resources.",
    "I've noted this. Please loop in the relevant department heads so we can move quickly.",
    "Understood. Prioritise the items with the highest customer impact and report back.",
    "Let's schedule a short sync on this. I want to make sure we have the full picture.",
];

const CTO_PHRASES: &[&str] = &[
    "I'll take a look at the technical side and get back to you with an assessment.",
    "Let's check the architecture implications before we change anything in production.",
    "Good catch. I'll ask the engineering team to scope this properly.",
];

const COO_PHRASES: &[&str] = &[
    "Noted. I'll check how this affects our current operational timelines.",
    "Let me coordinate with the teams involved and confirm the next steps.",
    "I'll add this to the operations review and track it to completion.",
];

const DEVELOPER_PHRASES: &[&str] = &[
    "On it. I'll open a ticket and start working on it right away.",
    "I'll investigate and push a fix once I've reproduced it locally.",
    "Sounds good, I'll update you as soon as I have something to show.",
];

const DEFAULT_PHRASES: &[&str] = &[
    "Message received. I'll respond as soon as I'm back online.",
    "Thanks, I've noted this and will follow up shortly.",
];

/// Phrase table for a role label.
pub fn phrases_for_role(role: &str) -> &'static [&'static str] {
    match role.trim().to_lowercase().as_str() {
        "ceo" | "chief executive officer" => CEO_PHRASES,
        "cto" | "chief technology officer" => CTO_PHRASES,
        "coo" | "chief operating officer" => COO_PHRASES,
        "developer" | "engineer" | "dev" => DEVELOPER_PHRASES,
        _ => DEFAULT_PHRASES,
    }
}

/// Canned reply used while the agent behind `role` is unreachable.
///
/// The choice depends only on `prompt`, so the same prompt always gets the
/// same reply.
pub fn canned_response(role: &str, prompt: &str) -> &'static str {
    let phrases = phrases_for_role(role);
    let seed = prompt
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    phrases[seed % phrases.len()]
}
