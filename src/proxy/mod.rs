//! Forwarding proxy subsystem.
//!
//! # Data Flow
//! ```text
//! GET /proxy?url=<target>
//!     → forward.rs (validate target, apply relay policy)
//!     → identity.rs (fixed browser headers on the outbound GET)
//!     → upstream server
//!     → headers.rs (drop upstream framing headers)
//!     → status + headers + streamed body back to the caller
//! ```
//!
//! # Design Decisions
//! - Upstream statuses are relayed verbatim, never treated as errors
//! - Network failures map to 502, deadlines to 504
//! - The relay policy is explicit configuration; empty means open relay

pub mod error;
pub mod forward;
pub mod headers;
pub mod identity;
pub mod policy;

pub use error::{ProxyBuildError, ProxyError};
pub use forward::{ForwardProxy, UpstreamResponse};
pub use headers::{filter_response_headers, EXCLUDED_RESPONSE_HEADERS};
pub use identity::UpstreamIdentity;
pub use policy::TargetPolicy;
