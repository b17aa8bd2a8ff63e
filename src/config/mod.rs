//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the forwarding proxy and swaps it in
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running without a file is supported
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the proxy identity, relay policy and timeouts are hot-reloaded;
//!   listener and console changes need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, ConsoleConfig, ListenerConfig, ObservabilityConfig, ProxySettings, RetryConfig,
    TimeoutConfig,
};
pub use watcher::{restart_required, ConfigWatcher};
