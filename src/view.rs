//! View events emitted by the session for UI projection and observability.
//!
//! The core holds no references to rendering primitives: the rendered view
//! is a pure projection of these events (plus the conversation history they
//! describe). Payloads are kept lightweight so the session can emit without
//! blocking the flush path.

use crate::session::messages::Message;

/// Events that describe what the conversation view should do "right now".
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// A new message entry was appended to the conversation.
    MessageAppended {
        /// The appended entry, including its assigned sequence id.
        message: Message,
    },
    /// The open bot message at the tail was rewritten in place.
    MessageUpdated {
        /// Sequence id of the rewritten entry.
        sequence_id: u64,
        /// Full replacement content.
        content: String,
    },
    /// History was replaced wholesale (conversation load).
    HistoryReplaced {
        /// The loaded conversation, when it has a saved identity.
        conversation_id: Option<i64>,
        /// The full ordered entry list.
        messages: Vec<Message>,
    },
    /// All rendered entries should be removed.
    HistoryCleared,
    /// The view should scroll to the newest entry.
    ScrollToBottom,
    /// Indeterminate progress indicator should start.
    ProgressStarted,
    /// Progress indicator should stop.
    ProgressStopped,
    /// Whether the send control accepts new prompts.
    SendEnabled {
        /// `false` while a held prompt is pending or the chat model is unavailable.
        enabled: bool,
    },
    /// The prompt input should be emptied (the prompt was accepted).
    PromptCleared,
    /// Whether a generation is currently in flight.
    GeneratingChanged {
        /// `true` from accepted submit until end-of-message.
        active: bool,
    },
}
