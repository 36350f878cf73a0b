//! Message and event types passed through the conversation core.

use crate::backend::{ModelKind, ModelStatus};
use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single rendered conversation entry.
///
/// Immutable once flushed, except the open bot message at the history
/// tail, which is rewritten in place while its reply streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the speaker.
    pub speaker_name: String,
    /// Message text.
    pub content: String,
    /// Whether the assistant produced this entry.
    pub is_bot: bool,
    /// Monotonically increasing position assigned at append time.
    pub sequence_id: u64,
    /// Owning conversation, when the conversation has been saved.
    pub conversation_id: Option<i64>,
    /// Heuristic mood label (bot messages only).
    pub mood: Option<String>,
    /// Display emoji for the mood (bot messages only).
    pub mood_emoji: Option<String>,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// A stored message as delivered by the persistence layer on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedMessage {
    /// Display name of the speaker.
    pub speaker_name: String,
    /// Message text.
    pub content: String,
    /// Whether the assistant produced this entry.
    pub is_bot: bool,
}

/// Payload of a streamed-response event from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Text carried by this event. May be empty on pure markers.
    pub message: String,
    /// First event of the reply; stops the progress indicator.
    pub is_first_message: bool,
    /// Final event of the reply; closes the generation turn.
    pub is_end_of_message: bool,
    /// Branch marker for sub-agent traffic. Events carrying a node id are
    /// not part of the main conversation and are ignored wholesale.
    pub node_id: Option<String>,
}

/// Inbound events consumed by the core's single dispatch function.
///
/// Hosts can deliver these as newline-delimited JSON envelopes; see
/// [`ChatEvent::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A streamed token fragment from the backend worker.
    Token {
        /// The decoded text fragment.
        text: String,
    },
    /// A streamed-response marker/fragment with turn metadata.
    Response {
        /// The event payload.
        response: ResponseEvent,
    },
    /// The user submitted a prompt.
    Submit {
        /// Raw prompt text; validated by the session.
        prompt: String,
    },
    /// A voice transcription to submit as a prompt.
    Transcription {
        /// Transcribed speech.
        text: String,
    },
    /// The user asked to interrupt the in-flight generation.
    Interrupt,
    /// The user asked to clear the conversation.
    ClearRequested,
    /// Persistence layer loaded a conversation.
    ConversationLoaded {
        /// Saved conversation identity, or `None` for a transient one.
        conversation_id: Option<i64>,
        /// Ordered stored messages.
        messages: Vec<LoadedMessage>,
    },
    /// Persistence layer deleted a conversation.
    ConversationDeleted {
        /// The deleted conversation's identity.
        conversation_id: i64,
    },
    /// Backend history was cleared; empty the local history too.
    ClearHistory,
    /// A model changed load state.
    ModelStatus {
        /// Which model the status refers to.
        model: ModelKind,
        /// New load state.
        status: ModelStatus,
    },
}

impl ChatEvent {
    /// Parse one JSON envelope from a host process.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Contract`]: malformed envelopes are rejected
    /// at the collaborator boundary, never tolerated inside the core.
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| ChatError::Contract(e.to_string()))
    }

    /// Serialize to a single-line JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Contract`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChatError::Contract(e.to_string()))
    }
}
