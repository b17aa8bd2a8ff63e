//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the admin console and forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarding proxy identity and relay policy.
    pub proxy: ProxySettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration for upstream network failures.
    pub retries: RetryConfig,

    /// Admin console and backend API settings.
    pub console: ConsoleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
        }
    }
}

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:141.0) Gecko/20100101 Firefox/141.0";

/// Browser identity presented to upstream servers, plus the relay policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// User-Agent sent on every upstream fetch.
    pub user_agent: String,

    /// Origin header sent on every upstream fetch.
    pub origin: String,

    /// Referer header sent on every upstream fetch.
    pub referer: String,

    /// Any other fixed request headers, by name.
    pub additional_headers: BTreeMap<String, String>,

    /// Hosts the proxy may contact. Empty means any host (open relay).
    /// Entries starting with `.` match the domain and all its subdomains.
    pub allowed_hosts: Vec<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        let additional_headers = [
            ("Accept", "*/*"),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Connection", "keep-alive"),
            ("Sec-Fetch-Dest", "empty"),
            ("Sec-Fetch-Mode", "cors"),
            ("Sec-Fetch-Site", "cross-site"),
            ("DNT", "1"),
            ("Sec-GPC", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: "https://www.dazn.com".to_string(),
            referer: "https://www.dazn.com/".to_string(),
            additional_headers,
            allowed_hosts: Vec::new(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for upstream response headers, and for whole backend API calls.
    pub request_secs: u64,

    /// Maximum silence between body chunks while streaming an upstream response.
    pub read_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            read_idle_secs: 30,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries of transient upstream network errors.
    pub enabled: bool,

    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Admin console configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Mount the console routes.
    pub enabled: bool,

    /// Base URL of the backend API (the `/login` and `/admin/*` endpoints live under it).
    pub api_base_url: String,

    /// Name of the session cookie.
    pub session_cookie: String,

    /// Upper bound on session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Maximum accepted form body size in bytes.
    pub max_form_bytes: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: "http://127.0.0.1:65000/api".to_string(),
            session_cookie: "iptv_session".to_string(),
            session_ttl_secs: 24 * 3600,
            max_form_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
