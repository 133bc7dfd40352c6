//! The wall: a per-node ordered, deduplicated message store.

use std::collections::HashSet;

use crate::message::{Message, MessageId, Visibility};

/// Append-only, deduplicated, timestamp-ordered collection of messages.
///
/// Duplicate delivery and out-of-order arrival are expected during
/// replication; `append` absorbs both.
#[derive(Debug, Default)]
pub struct Wall {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl Wall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message unless its id is already present.
    ///
    /// Returns `true` if the message was inserted. The store is kept sorted
    /// by `created_at`; the sort is stable, so same-timestamp messages keep
    /// insertion order.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        self.messages.sort_by_key(|m| m.created_at);
        true
    }

    /// Messages in display order. With `include_private == false` only the
    /// public subset is returned; this filter is the sole confidentiality
    /// boundary.
    pub fn list(&self, include_private: bool) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| include_private || m.visibility == Visibility::Public)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
