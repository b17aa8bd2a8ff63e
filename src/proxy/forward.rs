//! Upstream fetch and response relay.
//!
//! # Request lifecycle
//! ```text
//! AWAITING_TARGET_URL ──(present, parseable, permitted)──▶ FETCHING_UPSTREAM ──▶ RESPONDING
//!         │                                                      │
//!         └──▶ 400 / 403                                         └──▶ 502 / 504
//! ```
//!
//! The body is never buffered: chunks are forwarded as they arrive. When the
//! caller goes away the response body is dropped, which drops the upstream
//! connection with it.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use reqwest::redirect;
use url::Url;

use crate::config::AppConfig;
use crate::proxy::error::{ProxyBuildError, ProxyError};
use crate::proxy::headers::filter_response_headers;
use crate::proxy::identity::UpstreamIdentity;
use crate::proxy::policy::TargetPolicy;
use crate::resilience::{Deadlines, RetryPolicy};

const MAX_REDIRECTS: usize = 10;

/// Relays GET requests to caller-chosen upstream URLs.
#[derive(Debug, Clone)]
pub struct ForwardProxy {
    client: reqwest::Client,
    identity: UpstreamIdentity,
    policy: TargetPolicy,
    retry: RetryPolicy,
    response_timeout: Duration,
}

impl ForwardProxy {
    pub fn from_config(config: &AppConfig) -> Result<Self, ProxyBuildError> {
        let identity = UpstreamIdentity::from_settings(&config.proxy)?;
        let policy = TargetPolicy::from_hosts(&config.proxy.allowed_hosts);
        let retry = RetryPolicy::from_config(&config.retries);
        let deadlines = Deadlines::from(&config.timeouts);
        Self::new(identity, policy, retry, deadlines)
    }

    pub fn new(
        identity: UpstreamIdentity,
        policy: TargetPolicy,
        retry: RetryPolicy,
        deadlines: Deadlines,
    ) -> Result<Self, ProxyBuildError> {
        let redirect_policy = {
            let policy = policy.clone();
            redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if policy.permits(attempt.url()) {
                    attempt.follow()
                } else {
                    // Relay the 3xx itself rather than leave the allow-list.
                    attempt.stop()
                }
            })
        };

        let client = reqwest::Client::builder()
            .connect_timeout(deadlines.connect)
            .read_timeout(deadlines.read_idle)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(redirect_policy)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            identity,
            policy,
            retry,
            response_timeout: deadlines.request,
        })
    }

    pub fn policy(&self) -> &TargetPolicy {
        &self.policy
    }

    /// Validate a caller-supplied target: present, absolute http(s), permitted.
    pub fn resolve_target(&self, target: &str) -> Result<Url, ProxyError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ProxyError::MissingUrl);
        }

        let url = Url::parse(target).map_err(|_| ProxyError::InvalidUrl(target.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ProxyError::InvalidUrl(target.to_string()));
        }

        if !self.policy.permits(&url) {
            let host = url.host_str().unwrap_or_default().to_string();
            return Err(ProxyError::HostNotAllowed(host));
        }

        Ok(url)
    }

    /// GET `target` with the upstream identity and hand back the response
    /// with its body still streaming.
    pub async fn fetch(&self, target: &str) -> Result<UpstreamResponse, ProxyError> {
        let url = self.resolve_target(target)?;
        tracing::info!(host = url.host_str().unwrap_or_default(), "Proxying request");

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(&url).await {
                Ok(response) => return Ok(UpstreamResponse::new(response)),
                Err(err) => match self.retry.next_delay(attempt, &err) {
                    Some(delay) => {
                        tracing::info!(
                            host = url.host_str().unwrap_or_default(),
                            attempt,
                            delay = ?delay,
                            error = %err,
                            "Retrying upstream fetch"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<reqwest::Response, ProxyError> {
        let request = self
            .client
            .get(url.clone())
            .headers(self.identity.headers().clone())
            .send();

        match tokio::time::timeout(self.response_timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(ProxyError::UpstreamTimeout),
            // Target queries may carry access tokens.
            Ok(Err(e)) => Err(ProxyError::Upstream(e.without_url())),
            Err(_) => Err(ProxyError::UpstreamTimeout),
        }
    }
}

/// Upstream answer ready to relay: verbatim status, filtered headers,
/// streaming body.
#[derive(Debug)]
pub struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    inner: reqwest::Response,
}

impl UpstreamResponse {
    fn new(inner: reqwest::Response) -> Self {
        Self {
            status: inner.status(),
            headers: filter_response_headers(inner.headers()),
            inner,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers that will be relayed.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let stream = self
            .inner
            .bytes_stream()
            .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream aborted"));

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
