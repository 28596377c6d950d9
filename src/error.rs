//! Request error types and classification.
//!
//! Every failure a request can hit ends up as an [`ImageError`]: a status
//! code, an internal message that is only ever logged, and a public message
//! that is safe to send to the client.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::time::Duration;

use axum::http::StatusCode;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// How many `source()` levels an unexpected error records.
const DIAGNOSTIC_DEPTH: usize = 4;

/// Error taxonomy of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidMethod,
    InvalidSecret,
    Parse,
    Download,
    Timeout,
    Processing,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMethod => "invalid_method",
            Self::InvalidSecret => "invalid_secret",
            Self::Parse => "parse",
            Self::Download => "download",
            Self::Timeout => "timeout",
            Self::Processing => "processing",
            Self::Unexpected => "unexpected",
        }
    }
}

/// A classified request failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ImageError {
    kind: ErrorKind,
    status: StatusCode,
    message: String,
    public_message: String,
}

impl ImageError {
    /// Build a known error with explicit status and messages.
    pub fn new(
        kind: ErrorKind,
        status: StatusCode,
        message: impl Into<String>,
        public_message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            public_message: public_message.into(),
        }
    }

    pub fn invalid_method() -> Self {
        Self::new(
            ErrorKind::InvalidMethod,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request method",
            "Method doesn't allowed",
        )
    }

    pub fn invalid_secret() -> Self {
        Self::new(
            ErrorKind::InvalidSecret,
            StatusCode::FORBIDDEN,
            "Invalid secret",
            "Forbidden",
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, StatusCode::NOT_FOUND, message, "Invalid URL")
    }

    pub fn download(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Download,
            StatusCode::NOT_FOUND,
            message,
            "Image is unreachable",
        )
    }

    pub fn timeout(elapsed: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Timeout after {elapsed:?}"),
            "Timeout",
        )
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Processing,
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
            "Error while processing image",
        )
    }

    /// Wrap a failure outside the taxonomy. The internal message records the
    /// error and up to [`DIAGNOSTIC_DEPTH`] of its sources.
    pub fn unexpected(err: &(dyn StdError + 'static)) -> Self {
        let mut message = format!("Unexpected error: {err}");
        let mut source = err.source();
        let mut depth = 0;
        while let Some(cause) = source {
            if depth == DIAGNOSTIC_DEPTH {
                message.push_str(": ...");
                break;
            }
            let _ = write!(message, ": {cause}");
            source = cause.source();
            depth += 1;
        }

        Self::new(
            ErrorKind::Unexpected,
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "Internal error",
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Internal diagnostic message. Never sent to clients.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn public_message(&self) -> &str {
        &self.public_message
    }
}

/// Classify a collaborator failure: known errors pass through untouched,
/// anything else becomes an `Unexpected` error.
pub fn classify(err: BoxError) -> ImageError {
    match err.downcast::<ImageError>() {
        Ok(known) => *known,
        Err(other) => ImageError::unexpected(other.as_ref()),
    }
}

/// Result type for pipeline stages.
pub type ImageResult<T> = Result<T, ImageError>;
