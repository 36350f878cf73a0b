//! Conversation history store backing the rendered view.

use crate::session::messages::Message;

/// Ordered message store; insertion order is display order.
///
/// At most one "open" (still-streaming) bot message exists at any time,
/// and only at the tail. All other entries are immutable once appended.
/// The rendered view is a projection of this store; the store itself
/// holds no rendering handles.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    conversation_id: Option<i64>,
    tail_open: bool,
}

impl ConversationHistory {
    /// Create an empty, transient (unsaved) history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All entries in display order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The newest entry, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Identity of the active conversation (`None` while transient).
    #[must_use]
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    /// Set or reset the active conversation identity.
    pub fn set_conversation_id(&mut self, conversation_id: Option<i64>) {
        self.conversation_id = conversation_id;
    }

    /// Sequence id the next appended entry will receive (= entry count).
    #[must_use]
    pub fn next_sequence_id(&self) -> u64 {
        self.messages.len() as u64
    }

    /// Append a closed entry. Seals any open tail first.
    pub fn push(&mut self, message: Message) {
        self.tail_open = false;
        self.messages.push(message);
    }

    /// Append a still-streaming bot entry that later flushes may rewrite.
    pub fn push_open(&mut self, message: Message) {
        debug_assert!(message.is_bot, "only bot messages stream");
        self.messages.push(message);
        self.tail_open = true;
    }

    /// Whether the tail is an open bot message.
    #[must_use]
    pub fn tail_open(&self) -> bool {
        self.tail_open && self.messages.last().is_some_and(|m| m.is_bot)
    }

    /// Mutable access to the open tail bot message, if one exists.
    pub fn open_tail_mut(&mut self) -> Option<&mut Message> {
        if !self.tail_open() {
            return None;
        }
        self.messages.last_mut()
    }

    /// Seal the open tail. Called on end-of-message, interrupt, load, and
    /// clear; subsequent flushes append instead of rewriting.
    pub fn seal(&mut self) {
        self.tail_open = false;
    }

    /// Remove all entries. The conversation identity is untouched.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.tail_open = false;
    }

    /// Replace the history wholesale with an already-built entry list.
    pub fn replace_all(&mut self, conversation_id: Option<i64>, messages: Vec<Message>) {
        self.messages = messages;
        self.conversation_id = conversation_id;
        self.tail_open = false;
    }
}
