//! Forwarding proxy errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::proxy::identity::IdentityError;
use crate::resilience::Retryable;

/// Why a relay attempt produced no upstream response.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("missing target url")]
    MissingUrl,
    #[error("invalid target url '{0}'")]
    InvalidUrl(String),
    #[error("target host not allowed: {0}")]
    HostNotAllowed(String),
    #[error("upstream did not answer in time")]
    UpstreamTimeout,
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::HostNotAllowed(_) => StatusCode::FORBIDDEN,
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Metric label for network failures; `None` for caller mistakes.
    pub fn failure_kind(&self) -> Option<&'static str> {
        match self {
            ProxyError::UpstreamTimeout => Some("timeout"),
            ProxyError::Upstream(e) if e.is_connect() => Some("connect"),
            ProxyError::Upstream(_) => Some("other"),
            _ => None,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            ProxyError::MissingUrl => "Missing url",
            ProxyError::InvalidUrl(_) => "Invalid url",
            ProxyError::HostNotAllowed(_) => "Target host not allowed",
            ProxyError::UpstreamTimeout => "Upstream request timed out",
            ProxyError::Upstream(_) => "Upstream request failed",
        }
    }
}

impl Retryable for ProxyError {
    fn is_transient(&self) -> bool {
        match self {
            ProxyError::UpstreamTimeout => true,
            ProxyError::Upstream(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}

/// Failure assembling a [`ForwardProxy`](crate::proxy::ForwardProxy) from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ProxyBuildError {
    #[error("invalid upstream identity: {0}")]
    Identity(#[from] IdentityError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
