//! Configuration validation.
//!
//! Serde handles the syntax; this module checks values that parse but cannot
//! work: unparseable addresses, zero timeouts, header entries that are not
//! valid HTTP, a backend URL that is not absolute.
//!
//! All violations are collected, not just the first.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.read_idle_secs", timeouts.read_idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    let retries = &config.retries;
    if retries.enabled && retries.max_attempts == 0 {
        errors.push(ValidationError::new(
            "retries.max_attempts",
            "must be at least 1 when retries are enabled",
        ));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    let proxy = &config.proxy;
    for (field, value) in [
        ("proxy.user_agent", &proxy.user_agent),
        ("proxy.origin", &proxy.origin),
        ("proxy.referer", &proxy.referer),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(field, "not a valid header value"));
        }
    }
    for (name, value) in &proxy.additional_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "proxy.additional_headers",
                format!("'{}' is not a valid header name", name),
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(
                "proxy.additional_headers",
                format!("value of '{}' is not a valid header value", name),
            ));
        }
    }
    for host in &proxy.allowed_hosts {
        if host.trim_start_matches('.').is_empty() {
            errors.push(ValidationError::new(
                "proxy.allowed_hosts",
                "entries must name a host",
            ));
        }
    }

    let console = &config.console;
    if console.enabled {
        match Url::parse(&console.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::new(
                "console.api_base_url",
                format!("'{}' is not an absolute http(s) URL", console.api_base_url),
            )),
        }
        if console.session_cookie.is_empty()
            || HeaderName::from_bytes(console.session_cookie.as_bytes()).is_err()
        {
            errors.push(ValidationError::new(
                "console.session_cookie",
                "must be a non-empty token",
            ));
        }
        if console.session_ttl_secs == 0 {
            errors.push(ValidationError::new(
                "console.session_ttl_secs",
                "must be greater than zero",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
