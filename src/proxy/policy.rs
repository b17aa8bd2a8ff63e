//! Relay policy: which upstream hosts the proxy may contact.
//!
//! An empty allow-list keeps the proxy an open relay. Anyone who can reach
//! it can make it fetch any URL, including internal addresses.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostRule {
    /// `example.com`
    Exact(String),
    /// `.example.com`: the domain itself and every subdomain.
    Domain(String),
}

impl HostRule {
    fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim().trim_end_matches('.').to_ascii_lowercase();
        if let Some(domain) = entry.strip_prefix('.') {
            return (!domain.is_empty()).then(|| HostRule::Domain(domain.to_string()));
        }
        if entry.is_empty() {
            None
        } else {
            Some(HostRule::Exact(entry))
        }
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostRule::Exact(expected) => host == expected,
            HostRule::Domain(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TargetPolicy {
    rules: Vec<HostRule>,
}

impl TargetPolicy {
    pub fn from_hosts(hosts: &[String]) -> Self {
        Self {
            rules: hosts.iter().filter_map(|h| HostRule::parse(h)).collect(),
        }
    }

    /// True when every host is permitted.
    pub fn is_open(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn permits(&self, url: &Url) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.rules.iter().any(|rule| rule.matches(&host))
    }
}
