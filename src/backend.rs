//! Collaborator contracts for generation backends and model residency.
//!
//! The conversation core never performs inference, speech synthesis, or
//! model loading itself. It talks to those subsystems through the traits
//! in this module; hosts provide implementations backed by their worker
//! threads or processes. Calls are queued hand-offs, not blocking waits.

use crate::config::RequestConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which model a status event or residency query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// The conversational language model.
    Chat,
    /// The image-generation model.
    Art,
    /// The speech synthesis model.
    Speech,
}

/// Load state reported by the model host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// Not resident in memory.
    Unloaded,
    /// Load in progress.
    Loading,
    /// Resident and ready for requests.
    Loaded,
    /// Load attempted and failed.
    Failed,
}

/// The kind of work a prompt asks the backend to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    /// Let the backend route the prompt (application command detection).
    #[default]
    Auto,
    /// Plain conversational reply.
    Chat,
    /// Retrieval-augmented search over indexed documents.
    RagSearch,
    /// Produce an image from the prompt.
    GenerateImage,
}

/// Sampling options attached to a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Maximum tokens to generate per response.
    pub max_tokens: usize,
    /// Sampling temperature (0.0 = greedy, higher = more random).
    pub temperature: f64,
    /// Top-p (nucleus) sampling threshold.
    pub top_p: f64,
    /// Repeat penalty for generated tokens.
    pub repeat_penalty: f32,
}

impl RequestOptions {
    /// Build options from the configured request defaults.
    #[must_use]
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            repeat_penalty: config.repeat_penalty,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from_config(&RequestConfig::default())
    }
}

/// A single generation request handed to the backend worker.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Request identifier, unique per send.
    pub id: Uuid,
    /// The user prompt, already validated non-empty.
    pub prompt: String,
    /// Sampling options.
    pub options: RequestOptions,
    /// What the backend should do with the prompt.
    pub action: ChatAction,
    /// Whether the reply should also be spoken by the TTS collaborator.
    pub want_speech_reply: bool,
}

impl GenerationRequest {
    /// Build a request with a fresh id.
    #[must_use]
    pub fn new(
        prompt: String,
        options: RequestOptions,
        action: ChatAction,
        want_speech_reply: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            options,
            action,
            want_speech_reply,
        }
    }
}

/// Backend collaborator that produces streamed replies.
///
/// Tokens and response markers come back asynchronously as
/// [`ChatEvent`](crate::session::messages::ChatEvent)s on the session's
/// inbound channel; none of these calls wait for generation output.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Begin generating a reply for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be accepted (worker gone,
    /// queue closed). Streaming failures are reported via events instead.
    async fn send_request(&self, request: GenerationRequest) -> Result<()>;

    /// Advisory interrupt for the in-flight generation.
    ///
    /// The backend may keep emitting tokens briefly and still terminates
    /// the stream with an end-of-message marker.
    fn interrupt(&self);

    /// Reset stored backend conversation history.
    ///
    /// `conversation_id` of `None` clears the active/transient history.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot accept the reset.
    fn clear_history(&self, conversation_id: Option<i64>) -> Result<()>;
}

/// Model residency collaborator: decides which model occupies memory.
///
/// Only consulted before a send; the balancer itself (loading, eviction,
/// device placement) lives outside this crate.
pub trait ModelLoadBalancer: Send + Sync {
    /// Models currently resident in memory.
    fn loaded_models(&self) -> Vec<ModelKind>;

    /// Evict art-mode models so the chat model can load.
    fn switch_to_non_art_mode(&self);
}
