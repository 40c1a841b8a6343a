//! Domain-driven configuration management for sitehub
//!
//! Configuration is split by functional domain (server, registry database,
//! administrative database, provisioning, tenant pools, auth, logging). Each
//! domain validates itself and can be overridden from `SITEHUB_*` environment
//! variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    auth::{AuthConfig, HostBindingPolicy},
    database::DatabaseConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    pool::PoolConfig,
    provisioning::ProvisioningConfig,
    server::{Environment, ServerConfig},
    SitehubConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
