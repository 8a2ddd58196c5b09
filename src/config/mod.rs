//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or in-code ClientConfig
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → RecClient::new (signer, transports, monitor, URLs)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the client is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The region only supplies defaults; explicit hosts always win

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{from_toml_str, load_config, ConfigError};
pub use schema::{
    AuthConfig, ClientConfig, HealthCheckConfig, ObservabilityConfig, Region, Schema,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
