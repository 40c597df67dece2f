use std::sync::Arc;

use super::types::Message;

/// Canonical message sequence of the selected conversation.
///
/// Index 0 is the oldest message. Out-of-range access is clamped, never an error:
/// a display buffer showing fewer messages beats one that fails.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    conversation_id: Option<String>,
    messages: Arc<[Message]>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active sequence with the given conversation's messages
    pub fn select(&mut self, conversation_id: impl Into<String>, messages: Arc<[Message]>) {
        self.conversation_id = Some(conversation_id.into());
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.conversation_id = None;
        self.messages = Arc::from(Vec::new());
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Shared handle to the whole sequence
    pub fn messages(&self) -> Arc<[Message]> {
        Arc::clone(&self.messages)
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Messages `[start, end)` with both bounds clamped to `[0, len]`
    pub fn slice(&self, start: usize, end: usize) -> &[Message] {
        let end = end.min(self.messages.len());
        let start = start.min(end);
        &self.messages[start..end]
    }

    /// Locate `message` in the sequence.
    ///
    /// Uses the timestamp ordering to find the candidate run, then compares for
    /// equality so that identical timestamps from different senders don't collide.
    pub fn position_of(&self, message: &Message) -> Option<usize> {
        let first = self
            .messages
            .partition_point(|m| m.timestamp < message.timestamp);
        self.messages[first..]
            .iter()
            .take_while(|m| m.timestamp == message.timestamp)
            .position(|m| m == message)
            .map(|offset| first + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::fixtures::{message, messages, ts};

    fn store_with(count: usize) -> MessageStore {
        let mut store = MessageStore::new();
        store.select("c1", Arc::from(messages(count)));
        store
    }

    #[test]
    fn test_select_replaces_sequence() {
        let mut store = store_with(10);
        assert_eq!(store.len(), 10);
        assert_eq!(store.conversation_id(), Some("c1"));

        store.select("c2", Arc::from(messages(3)));
        assert_eq!(store.len(), 3);
        assert_eq!(store.conversation_id(), Some("c2"));
    }

    #[test]
    fn test_slice_in_range() {
        let store = store_with(10);
        let slice = store.slice(2, 5);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].text, "message 2");
        assert_eq!(slice[2].text, "message 4");
    }

    #[test]
    fn test_slice_clamps_out_of_range() {
        let store = store_with(10);
        assert_eq!(store.slice(8, 100).len(), 2);
        assert_eq!(store.slice(50, 100).len(), 0);
        assert_eq!(store.slice(7, 3).len(), 0);
        assert_eq!(store.slice(0, 10).len(), 10);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(4);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.conversation_id(), None);
        assert!(store.get(0).is_none());
    }

    #[test]
    fn test_position_of_disambiguates_equal_timestamps() {
        let same = ts(2, 12, 0);
        let seq = vec![
            message("alice", "before", ts(2, 11, 0)),
            message("alice", "one", same),
            message("bob", "two", same),
            message("bob", "after", ts(2, 13, 0)),
        ];
        let mut store = MessageStore::new();
        store.select("c", Arc::from(seq));

        assert_eq!(store.position_of(&message("bob", "two", same)), Some(2));
        assert_eq!(store.position_of(&message("alice", "one", same)), Some(1));
        assert_eq!(store.position_of(&message("carol", "two", same)), None);
    }
}
