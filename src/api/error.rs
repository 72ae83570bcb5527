//! Transport Errors

use std::fmt;

use crate::domain::EntityKind;

pub type ApiResult<T> = Result<T, ApiError>;

/// Why a call to the backend did not produce a usable answer
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection-level failure
    Network(String),
    /// No answer within the configured bound
    Timeout,
    /// Non-2xx HTTP status
    Status { code: u16, message: Option<String> },
    /// HTTP success but the envelope did not say `isSuccess: true`
    Rejected { message: Option<String> },
    /// Body could not be decoded
    Decode(String),
    /// The backend has no route for this operation
    Unsupported { kind: EntityKind, operation: &'static str },
    /// Local file access while preparing a request
    Io(String),
}

impl ApiError {
    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Timeout => write!(f, "Request timed out"),
            ApiError::Status { code, message: Some(msg) } => write!(f, "HTTP {}: {}", code, msg),
            ApiError::Status { code, message: None } => write!(f, "HTTP {}", code),
            ApiError::Rejected { message: Some(msg) } => write!(f, "Rejected: {}", msg),
            ApiError::Rejected { message: None } => write!(f, "Rejected by server"),
            ApiError::Decode(msg) => write!(f, "Invalid response: {}", msg),
            ApiError::Unsupported { kind, operation } => {
                write!(f, "{} does not support {}", kind, operation)
            }
            ApiError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
