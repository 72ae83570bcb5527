//! Editor Errors
//!
//! Every failure in the editor is returned to the caller as a value. None of
//! them is fatal; the caller decides how to show it.

use std::fmt;

use crate::api::ApiError;
use crate::domain::{EntityKind, RecordId};

/// A reference collection could not be loaded; it was replaced by an empty one
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub kind: EntityKind,
    pub cause: ApiError,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load {}: {}", self.kind.collection(), self.cause)
    }
}

impl std::error::Error for FetchError {}

/// Required fields left blank; nothing was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub missing_fields: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Please fill in required fields: {}", self.missing_fields.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// A write did not go through; the draft is untouched
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    Invalid(ValidationError),
    /// The server answered without `isSuccess: true`
    Rejected { message: Option<String> },
    Transport(ApiError),
}

impl SubmitError {
    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            SubmitError::Rejected { message } => message.as_deref(),
            SubmitError::Transport(e) => e.server_message(),
            SubmitError::Invalid(_) => None,
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        SubmitError::Invalid(e)
    }
}

impl From<ApiError> for SubmitError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Rejected { message } => SubmitError::Rejected { message },
            other => SubmitError::Transport(other),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Invalid(e) => write!(f, "{}", e),
            SubmitError::Rejected { message: Some(msg) } => write!(f, "Save failed: {}", msg),
            SubmitError::Rejected { message: None } => write!(f, "Save failed"),
            SubmitError::Transport(e) => write!(f, "Server connection failed: {}", e),
        }
    }
}

impl std::error::Error for SubmitError {}

/// The task archive could not be fetched or stored
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadError {
    Transport { task_uid: RecordId, cause: ApiError },
    /// The server answered with zero bytes
    Empty { task_uid: RecordId },
    Io(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Transport { task_uid, cause } => {
                write!(f, "Failed to download files for task {}: {}", task_uid, cause)
            }
            DownloadError::Empty { task_uid } => write!(f, "No files submitted for task {}", task_uid),
            DownloadError::Io(msg) => write!(f, "Failed to save download: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

/// A record shown on its own could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The credential names no employee
    Anonymous,
    /// A list the view depends on could not be read
    List(FetchError),
    Transport { kind: EntityKind, id: RecordId, cause: ApiError },
    Malformed { kind: EntityKind, id: RecordId, reason: String },
    /// Nothing in the list matched
    Missing { kind: EntityKind, key: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Anonymous => write!(f, "The token does not identify an employee"),
            LookupError::List(e) => write!(f, "{}", e),
            LookupError::Transport { kind, id, cause } => write!(f, "Failed to load {} {}: {}", kind, id, cause),
            LookupError::Malformed { kind, id, reason } => write!(f, "Unreadable {} {}: {}", kind, id, reason),
            LookupError::Missing { kind, key } => write!(f, "No {} match {}", kind, key),
        }
    }
}

impl std::error::Error for LookupError {}

/// Bad input to a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownField(String),
    WrongType { field: String, expected: &'static str },
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownField(field) => write!(f, "Unknown field: {}", field),
            FormError::WrongType { field, expected } => write!(f, "{} expects a {} value", field, expected),
            FormError::InvalidValue { field, reason } => write!(f, "Invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for FormError {}

/// An action that does not fit the dialog's current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogError {
    NotOpen,
    StillLoading,
    /// A submit is already in flight
    Busy,
    /// The dialog was closed or reopened before this result arrived
    Stale,
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogError::NotOpen => write!(f, "No dialog is open"),
            DialogError::StillLoading => write!(f, "Reference data is still loading"),
            DialogError::Busy => write!(f, "A save is already in progress"),
            DialogError::Stale => write!(f, "The dialog was closed before the result arrived"),
        }
    }
}

impl std::error::Error for DialogError {}

/// Anything an [`Editor`](crate::Editor) call can fail with
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Dialog(DialogError),
    Form(FormError),
    Submit(SubmitError),
    /// The record to edit could not be read
    Load(ApiError),
}

impl From<DialogError> for EditorError {
    fn from(e: DialogError) -> Self {
        EditorError::Dialog(e)
    }
}

impl From<FormError> for EditorError {
    fn from(e: FormError) -> Self {
        EditorError::Form(e)
    }
}

impl From<SubmitError> for EditorError {
    fn from(e: SubmitError) -> Self {
        EditorError::Submit(e)
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Dialog(e) => write!(f, "{}", e),
            EditorError::Form(e) => write!(f, "{}", e),
            EditorError::Submit(e) => write!(f, "{}", e),
            EditorError::Load(e) => write!(f, "Failed to load record: {}", e),
        }
    }
}

impl std::error::Error for EditorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_name_the_record() {
        let err = LookupError::Transport {
            kind: EntityKind::Project,
            id: RecordId::Num(4),
            cause: ApiError::Timeout,
        };
        assert!(err.to_string().starts_with("Failed to load projects 4"));

        let missing = LookupError::Missing {
            kind: EntityKind::Employee,
            key: "ana".to_string(),
        };
        assert_eq!(missing.to_string(), "No employees match ana");
    }

    #[test]
    fn test_rejection_keeps_server_message() {
        let err = SubmitError::from(ApiError::Rejected {
            message: Some("Name taken".to_string()),
        });
        assert_eq!(err.server_message(), Some("Name taken"));
        assert_eq!(err.to_string(), "Save failed: Name taken");
    }

    #[test]
    fn test_http_errors_are_transport_failures() {
        let err = SubmitError::from(ApiError::Status {
            code: 400,
            message: Some("bad date".to_string()),
        });
        assert!(matches!(err, SubmitError::Transport(_)));
        assert_eq!(err.server_message(), Some("bad date"));
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ValidationError {
            missing_fields: vec!["firstName".to_string(), "email".to_string()],
        };
        assert_eq!(err.to_string(), "Please fill in required fields: firstName, email");
    }
}
