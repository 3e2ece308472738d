//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → units.rs (size/time literals, rejected at parse time)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Malformed literals fail at startup, never at request time

pub mod loader;
pub mod schema;
pub mod units;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CacheConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, ProxyRule, RoutingConfig,
    SiteConfig, TimeoutConfig,
};
pub use units::{ByteSize, Seconds, UnitError};
