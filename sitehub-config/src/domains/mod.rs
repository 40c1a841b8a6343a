//! Domain-specific configuration modules

pub mod auth;
pub mod database;
pub mod logging;
pub mod pool;
pub mod provisioning;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main sitehub configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitehubConfig {
    /// HTTP server
    pub server: server::ServerConfig,

    /// Control-plane registry database (tenants, domains)
    pub registry_database: database::DatabaseConfig,

    /// Administrative connection used only for provisioning statements
    pub admin_database: database::DatabaseConfig,

    /// Tenant provisioning
    pub provisioning: provisioning::ProvisioningConfig,

    /// Per-tenant connection pools
    pub pool: pool::PoolConfig,

    /// Token verification and host binding
    pub auth: auth::AuthConfig,

    /// Logging
    pub logging: logging::LoggingConfig,
}

impl Default for SitehubConfig {
    fn default() -> Self {
        Self {
            server: server::ServerConfig::default(),
            registry_database: database::DatabaseConfig::default(),
            admin_database: database::DatabaseConfig::admin_default(),
            provisioning: provisioning::ProvisioningConfig::default(),
            pool: pool::PoolConfig::default(),
            auth: auth::AuthConfig::default(),
            logging: logging::LoggingConfig::default(),
        }
    }
}

impl SitehubConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.registry_database.validate()?;
        self.admin_database.validate()?;
        self.provisioning.validate()?;
        self.pool.validate()?;
        self.auth.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.auth.jwt_secret = "change-me".to_string();
        serde_yaml::to_string(&sample).unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
