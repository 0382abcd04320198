//! Request error types.
//!
//! Every failure is classified when it is created; the HTTP status is chosen
//! from that classification at the response boundary and nowhere else.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::engine::EngineError;
use crate::xml::escape_xml;

/// Content type of failure responses.
pub const ERROR_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Coarse failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AccessDenied,
    MissingParameter,
    MalformedParameter,
    UnknownLanguage,
    EngineFailure,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
            ErrorKind::MissingParameter
            | ErrorKind::MalformedParameter
            | ErrorKind::UnknownLanguage
            | ErrorKind::EngineFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::MissingParameter => "missing_parameter",
            ErrorKind::MalformedParameter => "malformed_parameter",
            ErrorKind::UnknownLanguage => "unknown_language",
            ErrorKind::EngineFailure => "engine_failure",
        }
    }
}

/// Errors that end a request.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Access to {path} from {origin} denied")]
    AccessDenied { origin: String, path: String },

    #[error("Missing '{name}' parameter")]
    MissingParameter { name: &'static str },

    /// A parameter that only bilingual checks require is absent.
    #[error("Missing '{name}' parameter for bilingual checks")]
    MissingBitextParameter { name: &'static str },

    /// A non-empty query segment without `=`.
    #[error("Malformed parameter '{pair}': expected key=value")]
    MalformedParameter { pair: String },

    /// Percent-escapes that do not decode to UTF-8, or an unreadable body.
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("Unknown language '{code}'")]
    UnknownLanguage { code: String },

    #[error("{0}")]
    Engine(#[from] EngineError),

    /// The blocking task running the engine panicked or was aborted.
    #[error("check aborted: {0}")]
    EngineTask(String),
}

impl CheckError {
    pub fn missing(name: &'static str) -> Self {
        Self::MissingParameter { name }
    }

    pub fn unknown_language(code: impl Into<String>) -> Self {
        Self::UnknownLanguage { code: code.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::AccessDenied { .. } => ErrorKind::AccessDenied,
            CheckError::MissingParameter { .. } | CheckError::MissingBitextParameter { .. } => {
                ErrorKind::MissingParameter
            }
            CheckError::MalformedParameter { .. } | CheckError::MalformedRequest { .. } => {
                ErrorKind::MalformedParameter
            }
            CheckError::UnknownLanguage { .. } => ErrorKind::UnknownLanguage,
            CheckError::Engine(_) | CheckError::EngineTask(_) => ErrorKind::EngineFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::AccessDenied => tracing::warn!(error = %self, "request denied"),
            ErrorKind::EngineFailure => tracing::error!(error = ?self, "engine failure"),
            _ => tracing::info!(error = %self, "rejected request"),
        }

        let body = format!("Error: {}", escape_xml(&self.to_string()));
        (
            self.status(),
            [(header::CONTENT_TYPE, ERROR_CONTENT_TYPE)],
            body,
        )
            .into_response()
    }
}

/// Result type alias using CheckError.
pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn only_access_denied_is_forbidden() {
        let denied = CheckError::AccessDenied {
            origin: "10.0.0.1".into(),
            path: "/".into(),
        };
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        for err in [
            CheckError::missing("text"),
            CheckError::MissingBitextParameter {
                name: "motherTongue",
            },
            CheckError::MalformedParameter { pair: "oops".into() },
            CheckError::unknown_language("tlh"),
            CheckError::Engine(EngineError::Check("boom".into())),
            CheckError::EngineTask("panicked".into()),
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "{err}");
        }
    }

    #[test]
    fn bilingual_missing_parameter_shares_the_kind() {
        let err = CheckError::MissingBitextParameter {
            name: "motherTongue",
        };
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert!(err.to_string().contains("motherTongue"));
        assert!(err.to_string().contains("bilingual"));
    }

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            CheckError::missing("language").to_string(),
            "Missing 'language' parameter"
        );
        assert_eq!(
            CheckError::unknown_language("tlh").to_string(),
            "Unknown language 'tlh'"
        );
    }

    #[tokio::test]
    async fn response_body_is_escaped_plain_text() {
        let response = CheckError::unknown_language("<b>").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            ERROR_CONTENT_TYPE
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Error: Unknown language &apos;&lt;b&gt;&apos;");
    }
}
