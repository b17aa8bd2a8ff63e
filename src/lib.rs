//! IPTV admin console and CORS-bypass forwarding proxy.

// Core subsystems
pub mod backend;
pub mod config;
pub mod console;
pub mod http;
pub mod proxy;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use proxy::ForwardProxy;
