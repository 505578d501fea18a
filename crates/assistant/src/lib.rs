//! `ledgerlens-assistant` - AI side of a balance-sheet session.
//!
//! Holds the per-session state (current analysis, context snapshot, grounded
//! conversation), the conversation manager and the one-shot summary, plus the
//! HTTP transports that implement the completion service.

pub mod conversation;
pub mod error;
pub mod gemini;
mod http;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod service;
pub mod session;
pub mod summary;

pub use conversation::{
    advance_conversation, advance_conversation_streaming, start_conversation, ChatReply, ConversationError,
    ReplyStatus,
};
pub use error::{ServiceError, ServiceErrorKind};
pub use provider::{connect, ConnectError};
pub use service::{ChatMessage, ChatTransport, CompletionService, Conversation, RemoteService, Role};
pub use session::{ConversationState, LoadOutcome, LoadedAnalysis, Session, SessionPhase};
pub use summary::{request_summary, summarize};
