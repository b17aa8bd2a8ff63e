//! Timeout settings for outbound calls.

use std::time::Duration;

use crate::config::TimeoutConfig;

/// Resolved deadlines applied to upstream and backend clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// TCP/TLS connection establishment.
    pub connect: Duration,
    /// Waiting for response headers (proxy) or a whole call (backend API).
    pub request: Duration,
    /// Silence allowed between body chunks.
    pub read_idle: Duration,
}

impl From<&TimeoutConfig> for Deadlines {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            request: Duration::from_secs(config.request_secs),
            read_idle: Duration::from_secs(config.read_idle_secs),
        }
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}
