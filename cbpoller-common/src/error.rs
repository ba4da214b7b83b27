// ================================================================
// File: cbpoller-common/src/error.rs
// ================================================================

use thiserror::Error;

/// A response body that could not be turned into an `EventsApiResponse`.
///
/// `path` points at the offending field, e.g. `events[0].method`, or `.` when
/// the top-level document itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid events response at `{path}`: {message}")]
pub struct DecodeError {
    path: String,
    message: String,
}

impl DecodeError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        DecodeError::new(path, err.into_inner().to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // Fatal HTTP classifications:
    #[error("Authentication failed (HTTP {status}), check username and token: {body}")]
    Authentication { status: u16, body: String },

    #[error("Access forbidden (HTTP {status}): {body}")]
    Forbidden { status: u16, body: String },

    #[error("Events endpoint not found (HTTP {status}): {body}")]
    NotFound { status: u16, body: String },

    #[error("Unhandled polling error after {attempts} attempt(s), status={status:?}: {cause}")]
    Unhandled {
        attempts: u32,
        status: Option<u16>,
        cause: String,
    },

    #[error("Client is not open; call open() before fetching events")]
    ClientNotOpen,

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. }
            | Error::Forbidden { status, .. }
            | Error::NotFound { status, .. } => Some(*status),
            Error::Unhandled { status, .. } => *status,
            _ => None,
        }
    }

    /// True for credential problems the user has to fix before restarting.
    pub fn is_fatal_auth(&self) -> bool {
        matches!(self, Error::Authentication { .. } | Error::Forbidden { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_http_errors() {
        let err = Error::NotFound { status: 404, body: String::new() };
        assert_eq!(err.status(), Some(404));

        let err = Error::Unhandled { attempts: 6, status: Some(503), cause: "boom".into() };
        assert_eq!(err.status(), Some(503));

        assert_eq!(Error::ClientNotOpen.status(), None);
    }

    #[test]
    fn auth_classes_are_flagged() {
        assert!(Error::Authentication { status: 401, body: String::new() }.is_fatal_auth());
        assert!(Error::Forbidden { status: 403, body: String::new() }.is_fatal_auth());
        assert!(!Error::NotFound { status: 404, body: String::new() }.is_fatal_auth());
    }

    #[test]
    fn decode_error_display_names_the_path() {
        let err = DecodeError::new("events[2].tip.tokens", "tip tokens must be at least 1, got 0");
        assert_eq!(
            err.to_string(),
            "invalid events response at `events[2].tip.tokens`: tip tokens must be at least 1, got 0"
        );
    }
}
