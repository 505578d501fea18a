//! Conversation manager.
//!
//! One conversation handle per data epoch: the handle is created on the first
//! turn (or an explicit start) with a system instruction embedding the current
//! snapshot, reused for every later turn, and discarded only when the data it
//! was grounded in is no longer current. Service failures never escape as
//! errors; they become the assistant's reply for that turn.

use std::fmt;

use ledgerlens_analysis::ContextSnapshot;

use crate::error::{ServiceError, ServiceErrorKind};
use crate::prompts::chat_system_instruction;
use crate::service::{CompletionService, Conversation};
use crate::session::{ConversationState, Session};

pub const NO_DATA_NOTICE: &str = "No balance sheet loaded. Load a file before asking questions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Answered,
    /// The service failed; the reply is the error text
    ServiceFailed(ServiceErrorKind),
    /// AI is blocked by an earlier auth failure; the service was not contacted
    Blocked,
    /// Nothing loaded; history untouched
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub status: ReplyStatus,
}

impl ChatReply {
    pub fn is_answered(&self) -> bool {
        self.status == ReplyStatus::Answered
    }
}

/// Why a conversation could not be started.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationError {
    NoData,
    Blocked(String),
    Service(ServiceError),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str(NO_DATA_NOTICE),
            Self::Blocked(reason) => f.write_str(&blocked_notice(reason)),
            Self::Service(e) => f.write_str(&e.user_message()),
        }
    }
}

impl std::error::Error for ConversationError {}

pub(crate) fn blocked_notice(reason: &str) -> String {
    format!("AI features are disabled until the API key is fixed ({reason}).")
}

/// Create the grounded handle ahead of the first question.
pub fn start_conversation(session: &mut Session, service: &dyn CompletionService) -> Result<(), ConversationError> {
    let Some(loaded) = session.current().cloned() else {
        return Err(ConversationError::NoData);
    };
    if let Some(reason) = session.service_block() {
        return Err(ConversationError::Blocked(reason.to_string()));
    }
    let language = session.language().to_string();
    match grounded_handle(&mut session.conversation, service, &loaded.snapshot, &language) {
        Ok(_) => Ok(()),
        Err(e) => {
            if e.kind() == ServiceErrorKind::Auth {
                session.block_service(e.to_string());
            }
            Err(ConversationError::Service(e))
        }
    }
}

/// Submit one user turn and record it with its reply.
pub fn advance_conversation(session: &mut Session, service: &dyn CompletionService, text: &str) -> ChatReply {
    advance(session, service, text, None)
}

/// As [`advance_conversation`], delivering the reply in chunks as it arrives.
/// Exactly one assistant turn is recorded.
pub fn advance_conversation_streaming(
    session: &mut Session,
    service: &dyn CompletionService,
    text: &str,
    on_chunk: &mut dyn FnMut(&str),
) -> ChatReply {
    advance(session, service, text, Some(on_chunk))
}

fn advance(
    session: &mut Session,
    service: &dyn CompletionService,
    text: &str,
    on_chunk: Option<&mut dyn FnMut(&str)>,
) -> ChatReply {
    let Some(loaded) = session.current().cloned() else {
        return ChatReply {
            text: NO_DATA_NOTICE.to_string(),
            status: ReplyStatus::NoData,
        };
    };

    if let Some(reason) = session.service_block() {
        let notice = blocked_notice(reason);
        session.conversation.record_exchange(text, &notice);
        return ChatReply {
            text: notice,
            status: ReplyStatus::Blocked,
        };
    }

    let language = session.language().to_string();
    let result = grounded_handle(&mut session.conversation, service, &loaded.snapshot, &language)
        .and_then(|handle| match on_chunk {
            Some(cb) => handle.send_streaming(text, cb),
            None => handle.send(text),
        });

    match result {
        Ok(reply) => {
            session.conversation.record_exchange(text, &reply);
            ChatReply {
                text: reply,
                status: ReplyStatus::Answered,
            }
        }
        Err(e) => {
            log::warn!("chat turn failed: {}", e);
            let kind = e.kind();
            if kind == ServiceErrorKind::Auth {
                session.block_service(e.to_string());
            }
            let message = e.user_message();
            session.conversation.record_exchange(text, &message);
            ChatReply {
                text: message,
                status: ReplyStatus::ServiceFailed(kind),
            }
        }
    }
}

/// The handle grounded in `snapshot`, creating it when absent. A handle
/// grounded in any other snapshot is discarded together with its history.
fn grounded_handle<'a>(
    conv: &'a mut ConversationState,
    service: &dyn CompletionService,
    snapshot: &ContextSnapshot,
    language: &str,
) -> Result<&'a mut Box<dyn Conversation>, ServiceError> {
    let grounded = conv.active_snapshot.as_ref() == Some(snapshot);
    let handle = match conv.handle.take() {
        Some(handle) if grounded => handle,
        previous => {
            if previous.is_some() || conv.active_snapshot.is_some() {
                log::warn!("discarding conversation grounded in stale data");
                conv.clear();
            }
            let handle = service.create_conversation(&chat_system_instruction(snapshot, language))?;
            log::info!("conversation started (snapshot {})", snapshot.fingerprint());
            conv.active_snapshot = Some(snapshot.clone());
            handle
        }
    };
    Ok(conv.handle.insert(handle))
}
