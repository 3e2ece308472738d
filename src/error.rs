//! Error types and result aliases.

use axum::http::{Method, StatusCode};
use url::Url;

use crate::config::validation::ValidationError;
use crate::config::ConfigError;
use crate::routing::EscapeError;

/// Per-request failures. Each one ends in an HTTP response; none escapes
/// the handler.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No prefix rule matches the request path.
    #[error("no proxy rule matches `{path}`")]
    NoRuleMatched { path: String },

    /// The sanitized path resolves outside the rule's target.
    #[error(transparent)]
    PathEscapesTarget(#[from] EscapeError),

    /// The inbound body could not be read within the configured limit.
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    /// The redirect location is not a valid header value.
    #[error("redirect location `{0}` is not a valid header value")]
    InvalidRedirect(String),

    /// DNS, connect, TLS, timeout, or body transfer failure.
    #[error("upstream {method} {url} failed: {source}")]
    Upstream {
        method: Method,
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoRuleMatched { .. } => StatusCode::NOT_FOUND,
            ProxyError::PathEscapesTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::RequestBody(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidRedirect(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Plain-text body sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::NoRuleMatched { .. } => "Not Found",
            ProxyError::PathEscapesTarget(_) => "Bad Request",
            ProxyError::RequestBody(_) => "Payload Too Large",
            ProxyError::InvalidRedirect(_) => "Internal Server Error",
            ProxyError::Upstream { .. } => "Bad Gateway",
        }
    }
}

/// Failures building or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Vec<ValidationError>> for ServerError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ServerError::Config(ConfigError::Validation(errors))
    }
}
