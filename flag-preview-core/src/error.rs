//! # error: failure taxonomy for lookup, fetch and request handling
//!
//! Every fallible operation in this crate returns [`PreviewError`]. The
//! variants describe *what happened* (a non-2xx status, a missing key, a
//! timeout); [`PreviewError::kind`] folds them into the coarse, machine-readable
//! [`ErrorKind`] that the request boundary turns into an HTTP status.
//!
//! Nothing here is retried. The only negative result that is not an error is
//! "no content type matched" during discovery, which is an `Option::None`.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// A required field of the content reference is missing or invalid.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Credentials are missing or incomplete.
    #[error("Missing Contentstack configuration: {missing}")]
    Configuration { missing: String },

    /// The content-type listing call did not succeed.
    #[error("Content type listing unavailable: HTTP {status_code}")]
    DiscoveryUnavailable { status_code: u16 },

    /// The delivery API answered with a non-success status.
    #[error("HTTP {status_code}: {raw_body}")]
    FetchFailed { status_code: u16, raw_body: String },

    /// A successful response did not carry the expected `entry`/`asset` object.
    #[error("No {key} found in response")]
    ContentMissing { key: &'static str },

    /// The response body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Network failure or timeout.
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Machine-readable error class surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Configuration,
    Auth,
    NotFound,
    ContentType,
    Transport,
    Internal,
}

impl ErrorKind {
    /// Classify an upstream HTTP status.
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            422 => ErrorKind::ContentType,
            _ => ErrorKind::Internal,
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Auth => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::ContentType => 422,
            ErrorKind::Configuration | ErrorKind::Transport | ErrorKind::Internal => 500,
        }
    }

    /// Short human label used as the `error` field of boundary responses.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Invalid Request",
            ErrorKind::Configuration => "Configuration Error",
            ErrorKind::Auth => "Authentication Failed",
            ErrorKind::NotFound => "Content Not Found",
            ErrorKind::ContentType => "Content Type Error",
            ErrorKind::Transport => "Upstream Unavailable",
            ErrorKind::Internal => "Internal Server Error",
        }
    }
}

impl PreviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PreviewError::Validation(_) => ErrorKind::Validation,
            PreviewError::Configuration { .. } => ErrorKind::Configuration,
            PreviewError::DiscoveryUnavailable { status_code }
            | PreviewError::FetchFailed { status_code, .. } => ErrorKind::from_status(*status_code),
            PreviewError::ContentMissing { .. } | PreviewError::NotFound(_) => ErrorKind::NotFound,
            PreviewError::Decode(_) | PreviewError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Upstream status code, if the error came from a delivery API response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PreviewError::DiscoveryUnavailable { status_code }
            | PreviewError::FetchFailed { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PreviewError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PreviewError::Transport(format!("timed out: {e}"))
        } else {
            PreviewError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(e: serde_json::Error) -> Self {
        PreviewError::Decode(e.to_string())
    }
}
