//! Conversation store.
//!
//! Ordered list of messages and the single source of truth for rendering.
//! Messages are never reordered and ids are never reused.

use std::collections::HashSet;

use crate::message::{Message, MessageId};

/// Ordered message list with unique, monotonically assigned ids.
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    /// Ids handed out so far, including removed messages.
    used_ids: HashSet<MessageId>,
    /// Next id to assign.
    next_id: u64,
    /// Bumped on every mutation.
    revision: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            used_ids: HashSet::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Append a message, returning its id.
    ///
    /// A requested id is kept only if it has never been used in this store;
    /// otherwise a fresh one is assigned.
    pub fn append(&mut self, mut message: Message) -> MessageId {
        let requested = message.id;
        let id = if requested.is_assigned() && !self.used_ids.contains(&requested) {
            self.next_id = self.next_id.max(requested.0 + 1);
            requested
        } else {
            let id = MessageId(self.next_id);
            self.next_id += 1;
            id
        };

        self.used_ids.insert(id);
        message.id = id;
        self.messages.push(message);
        self.revision += 1;
        id
    }

    /// Remove a message by id. Unknown ids are a no-op.
    pub fn remove_by_id(&mut self, id: MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        self.revision += 1;
        Some(self.messages.remove(index))
    }

    /// All messages in insertion order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages currently flagged as loading placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_loading()).count()
    }

    /// Mutation counter, for observers that poll for changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop every message. Ids stay reserved.
    pub fn clear(&mut self) {
        if !self.messages.is_empty() {
            self.messages.clear();
            self.revision += 1;
        }
    }
}
