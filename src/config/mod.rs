//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (ALLOWED_IPS, PORT)
//!     → validation.rs (semantic checks)
//!     → VaultConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::VaultConfig;
pub use schema::{
    AccessConfig, EntitlementConfig, ListenerConfig, ObservabilityConfig, SecurityConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
