//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.toml (+ config.<env>.toml overlay)
//!     → loader.rs (parse, merge, env override)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → copied into each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_layered, ConfigError};
pub use schema::{
    CacheConfig, FanOutConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, PolygonConfig,
    TimeoutConfig,
};
