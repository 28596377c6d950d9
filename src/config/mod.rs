//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, normalize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → copied into the subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the admission capacity in particular
//!   never changes at runtime, so there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DownloadConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, ProcessingConfig,
    ResponseConfig, SecurityConfig, TimeoutConfig,
};
