//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect / response-header / idle-read deadlines)
//!     → On failure: retries.rs (transient? attempts left?)
//!     → backoff.rs (exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Every outbound call has a deadline
//! - Retries only for GET and only for network errors, never for statuses
//! - Retries are off unless configured

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{RetryPolicy, Retryable};
pub use timeouts::Deadlines;
