//! Error types for the aria conversation core.

/// Top-level error type for the conversation core.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Malformed collaborator event at the core boundary.
    #[error("contract error: {0}")]
    Contract(String),

    /// Backend collaborator error (send / interrupt / clear).
    #[error("backend error: {0}")]
    Backend(String),

    /// Rendered-view operation failed (e.g. view torn down mid-update).
    #[error("view error: {0}")]
    View(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChatError>;
