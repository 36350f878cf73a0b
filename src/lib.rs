//! Aria: streaming conversation core for a desktop AI assistant.
//!
//! This crate provides the pipeline between a streaming LLM backend and a
//! rendered chat view:
//! prompt → session state machine → token buffer → periodic flush →
//! history update → view events
//!
//! # Architecture
//!
//! The pipeline is built from small single-purpose stages driven by one
//! coordinator task:
//! - **Token buffer**: accumulates streamed fragments between flushes
//! - **Flush scheduler**: fixed-interval drain decoupling token-arrival
//!   rate from view-update rate
//! - **Stream controller**: appends new history entries or rewrites the
//!   open bot message in place
//! - **Generation session**: Idle / Generating / Generating+Held state
//!   machine with advisory interrupts
//! - **View events**: the rendered view is a pure projection of the
//!   conversation history; the core holds no rendering handles
//!
//! Inference, speech synthesis, model residency, and persistence are
//! external collaborators reached through the traits in [`backend`].

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod mood;
pub mod session;
pub mod text;
pub mod view;

pub use backend::{
    ChatAction, GenerationBackend, GenerationRequest, ModelKind, ModelLoadBalancer, ModelStatus,
    RequestOptions,
};
pub use config::AssistantConfig;
pub use error::{ChatError, Result};
pub use session::coordinator::{ChatCore, SessionCoordinator, SessionHandle};
pub use session::messages::{ChatEvent, LoadedMessage, Message, ResponseEvent};
pub use view::ViewEvent;
