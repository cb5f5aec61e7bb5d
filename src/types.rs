//! Shared error type for Lyceum
//!
//! Every variant maps to a fixed HTTP status so client mistakes never surface
//! as a generic server error.

use hyper::StatusCode;
use thiserror::Error;

/// Errors raised by the stores, engines and route handlers
#[derive(Debug, Error)]
pub enum LyceumError {
    /// A required form field was absent
    #[error("Missing form field: {0}")]
    MissingField(String),

    /// The topic is not a key of the rules table
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// A field could not be coerced to the expected type
    #[error("Field '{field}' is not a valid number: {value:?}")]
    TypeCoercion { field: String, value: String },

    /// An answer arrived while no exam was running
    #[error("No exam in progress")]
    ExamNotInProgress,

    /// A result was requested before the last answer
    #[error("Exam not finished yet")]
    ExamNotFinished,

    /// The client has no (or an expired) exam session
    #[error("No exam session")]
    NoExamSession,

    /// The request body could not be decoded
    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    /// Startup configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LyceumError {
    /// HTTP status used when this error reaches a route boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            LyceumError::MissingField(_)
            | LyceumError::TypeCoercion { .. }
            | LyceumError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            LyceumError::UnknownTopic(_) => StatusCode::NOT_FOUND,
            LyceumError::ExamNotInProgress | LyceumError::ExamNotFinished => StatusCode::CONFLICT,
            LyceumError::NoExamSession => StatusCode::SEE_OTHER,
            LyceumError::Config(_) | LyceumError::Io(_) | LyceumError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the error was caused by the client request
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

pub type Result<T> = std::result::Result<T, LyceumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_4xx() {
        assert_eq!(
            LyceumError::MissingField("uid".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LyceumError::TypeCoercion {
                field: "amount".into(),
                value: "ten".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LyceumError::UnknownTopic("ghost".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert!(LyceumError::ExamNotFinished.is_client_error());
        assert!(!LyceumError::Config("bad".into()).is_client_error());
    }

    #[test]
    fn test_messages_name_the_field() {
        let err = LyceumError::MissingField("research_content".into());
        assert_eq!(err.to_string(), "Missing form field: research_content");
    }
}
