//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing)
//!     → GET /proxy?url=…  → proxy::ForwardProxy (current snapshot)
//!     → everything else   → console router (when enabled)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
