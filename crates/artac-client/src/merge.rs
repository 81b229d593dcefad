//! Reconciliation of remote and locally cached message lists.
//!
//! An optimistic local copy and the server-persisted copy of the same send
//! carry different ids and slightly different timestamps, so duplicates are
//! recognised by similarity rather than by id.

use std::collections::HashMap;

use artac_shared::constants::DUPLICATE_WINDOW_MS;
use artac_shared::types::{Message, MessageId};

/// Same author, identical content, timestamps strictly less than
/// [`DUPLICATE_WINDOW_MS`] apart.
pub fn is_duplicate(a: &Message, b: &Message) -> bool {
    a.user_id == b.user_id
        && a.content == b.content
        && (a.timestamp - b.timestamp).num_milliseconds().abs() < DUPLICATE_WINDOW_MS
}

/// Merge a remote list with a local one.
///
/// The lists are concatenated remote first, so when two entries describe the
/// same event the server copy is the one kept. Entries sharing an id are
/// folded together first, taking over a local edit. Similarity is checked
/// afterwards against the folded content, and a later entry that duplicates
/// a kept one is dropped. Reactions and pins live only on the client, so a
/// dropped copy hands them to the survivor. The result is sorted ascending
/// by timestamp (stable).
pub fn merge_messages(remote: Vec<Message>, local: Vec<Message>) -> Vec<Message> {
    let mut unique: Vec<Message> = Vec::with_capacity(remote.len() + local.len());
    let mut by_id: HashMap<MessageId, usize> = HashMap::new();

    for message in remote.into_iter().chain(local) {
        match by_id.get(&message.id) {
            Some(&idx) => {
                let survivor = &mut unique[idx];
                if message.edited_at.is_some() {
                    survivor.content = message.content.clone();
                    survivor.edited_at = message.edited_at;
                }
                absorb_local_state(survivor, message);
            }
            None => {
                by_id.insert(message.id.clone(), unique.len());
                unique.push(message);
            }
        }
    }

    let mut kept: Vec<Message> = Vec::with_capacity(unique.len());
    for message in unique {
        match kept.iter_mut().find(|k| is_duplicate(k, &message)) {
            Some(survivor) => absorb_local_state(survivor, message),
            None => kept.push(message),
        }
    }

    kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    kept
}

fn absorb_local_state(survivor: &mut Message, dropped: Message) {
    survivor.pinned |= dropped.pinned;
    for (emoji, users) in dropped.reactions {
        survivor.reactions.entry(emoji).or_default().extend(users);
    }
}
