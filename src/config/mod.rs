//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResilienceConfig (validated, immutable)
//!     → RetryPolicy / CircuitBreakerConfig built from its sections
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BreakerConfig;
pub use schema::EndpointConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ResilienceConfig;
pub use schema::RetryConfig;
pub use schema::TimeoutConfig;
pub use validation::{validate_config, ValidationError};
