use std::fmt;

/// Failure reported by a completion service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Credentials rejected (401/403, invalid key)
    Auth(String),
    /// Rate limit or quota exhausted (429)
    Quota(String),
    /// Any other non-success response
    Api { status: u16, message: String },
    /// Connect, timeout or body read failure
    Transport(String),
    /// Success status but the body had no usable text
    InvalidResponse(String),
}

/// Coarse classification used by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// No AI feature proceeds until the key is fixed
    Auth,
    /// Transient turn failure
    Service,
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Auth(_) => ServiceErrorKind::Auth,
            _ => ServiceErrorKind::Service,
        }
    }

    /// Text shown inline in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(msg) => format!(
                "AI service rejected the API key ({msg}). Fix the key, then retry."
            ),
            Self::Quota(msg) => format!("AI service quota exceeded ({msg}). Try again later."),
            Self::Api { status, message } => {
                format!("AI service error (HTTP {status}): {message}")
            }
            Self::Transport(msg) => format!("Could not reach the AI service: {msg}"),
            Self::InvalidResponse(msg) => format!("AI service returned an unusable reply: {msg}"),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Self::Quota(msg) => write!(f, "quota exceeded: {msg}"),
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::Transport(msg) => write!(f, "network error: {msg}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Map a non-success HTTP status and the provider's error message.
pub(crate) fn classify_status(status: u16, message: String) -> ServiceError {
    match status {
        401 | 403 => ServiceError::Auth(message),
        429 => ServiceError::Quota(message),
        _ => ServiceError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401, "bad".into()).kind(), ServiceErrorKind::Auth);
        assert_eq!(classify_status(403, "bad".into()).kind(), ServiceErrorKind::Auth);
        assert!(matches!(classify_status(429, "slow".into()), ServiceError::Quota(_)));
        assert_eq!(
            classify_status(500, "boom".into()),
            ServiceError::Api { status: 500, message: "boom".into() }
        );
    }

    #[test]
    fn test_quota_is_transient() {
        assert_eq!(ServiceError::Quota("x".into()).kind(), ServiceErrorKind::Service);
        assert_eq!(ServiceError::Transport("x".into()).kind(), ServiceErrorKind::Service);
    }

    #[test]
    fn test_user_message_mentions_status() {
        let err = ServiceError::Api { status: 503, message: "overloaded".into() };
        assert_eq!(err.user_message(), "AI service error (HTTP 503): overloaded");
    }
}
