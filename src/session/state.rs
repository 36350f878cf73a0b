//! Generation session state machine.
//!
//! Tracks whether a generation is in flight and carries at most one held
//! prompt: a submission that arrived mid-generation, deferred until the
//! in-flight reply ends. Empty-prompt validation happens before
//! the machine is consulted; it only sees prompts worth sending.

/// Where the session is in the prompt → reply cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    /// No generation in flight; submissions start immediately.
    #[default]
    Idle,
    /// A generation is in flight; submissions received now are held.
    Generating {
        /// Prompt deferred until the in-flight reply ends. Later held
        /// prompts overwrite earlier ones (last write wins).
        held_prompt: Option<String>,
    },
}

/// What the caller should do after offering a prompt to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// Start a backend request for this prompt.
    Send,
    /// The prompt was held; interrupt the in-flight generation and wait
    /// for its end-of-message.
    Held,
}

impl GenerationState {
    /// Whether a generation is in flight.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating { .. })
    }

    /// The currently held prompt, if any.
    #[must_use]
    pub fn held_prompt(&self) -> Option<&str> {
        match self {
            Self::Generating { held_prompt } => held_prompt.as_deref(),
            Self::Idle => None,
        }
    }

    /// Offer a prompt to the session.
    ///
    /// Idle → enter `Generating` and tell the caller to send. While
    /// generating → store the prompt as held (overwriting any previous
    /// one) and tell the caller to interrupt-and-wait.
    pub fn offer(&mut self, prompt: &str) -> SubmitDisposition {
        match self {
            Self::Idle => {
                *self = Self::Generating { held_prompt: None };
                SubmitDisposition::Send
            }
            Self::Generating { held_prompt } => {
                *held_prompt = Some(prompt.to_owned());
                SubmitDisposition::Held
            }
        }
    }

    /// Close the current turn, returning to `Idle`.
    ///
    /// Returns the held prompt, if any, already cleared from the machine
    /// so resubmitting it cannot loop.
    pub fn finish(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Generating { held_prompt } => held_prompt,
        }
    }
}
