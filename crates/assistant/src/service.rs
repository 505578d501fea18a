//! Completion service seam.
//!
//! The session only talks to [`CompletionService`] and [`Conversation`]. HTTP
//! providers implement the lower-level [`ChatTransport`] (stateless: system
//! instruction + full turn list in, reply text out) and are lifted into a
//! completion service by [`RemoteService`], whose conversation handle keeps
//! the turn list client-side.

use std::sync::Arc;

use serde::Serialize;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A stateful chat grounded in the system instruction it was created with.
pub trait Conversation {
    fn send(&mut self, text: &str) -> Result<String, ServiceError>;

    /// Deliver the reply incrementally; returns the full text.
    fn send_streaming(
        &mut self,
        text: &str,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, ServiceError> {
        let reply = self.send(text)?;
        on_chunk(&reply);
        Ok(reply)
    }
}

pub trait CompletionService {
    /// One-shot request, no conversation state.
    fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, ServiceError>;

    fn create_conversation(&self, system: &str) -> Result<Box<dyn Conversation>, ServiceError>;
}

/// Stateless provider request.
pub trait ChatTransport {
    fn complete(&self, system: Option<&str>, turns: &[ChatMessage]) -> Result<String, ServiceError>;

    fn complete_streaming(
        &self,
        system: Option<&str>,
        turns: &[ChatMessage],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, ServiceError>;
}

pub struct RemoteService<T> {
    transport: Arc<T>,
}

impl<T: ChatTransport> RemoteService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }
}

impl<T: ChatTransport + 'static> CompletionService for RemoteService<T> {
    fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, ServiceError> {
        self.transport.complete(system, &[ChatMessage::user(prompt)])
    }

    fn create_conversation(&self, system: &str) -> Result<Box<dyn Conversation>, ServiceError> {
        Ok(Box::new(RemoteConversation {
            transport: Arc::clone(&self.transport),
            system: system.to_string(),
            turns: Vec::new(),
        }))
    }
}

struct RemoteConversation<T> {
    transport: Arc<T>,
    system: String,
    turns: Vec<ChatMessage>,
}

impl<T: ChatTransport> RemoteConversation<T> {
    fn exchange(
        &mut self,
        text: &str,
        on_chunk: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String, ServiceError> {
        self.turns.push(ChatMessage::user(text));
        let result = match on_chunk {
            Some(cb) => self.transport.complete_streaming(Some(&self.system), &self.turns, cb),
            None => self.transport.complete(Some(&self.system), &self.turns),
        };
        match result {
            Ok(reply) => {
                self.turns.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                // Providers reject consecutive user turns; keep the log alternating
                self.turns.pop();
                Err(e)
            }
        }
    }
}

impl<T: ChatTransport> Conversation for RemoteConversation<T> {
    fn send(&mut self, text: &str) -> Result<String, ServiceError> {
        self.exchange(text, None)
    }

    fn send_streaming(
        &mut self,
        text: &str,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, ServiceError> {
        self.exchange(text, Some(on_chunk))
    }
}
