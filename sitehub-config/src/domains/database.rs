//! Database configuration
//!
//! Used twice: once for the control-plane registry pool and once for the
//! single administrative connection that issues CREATE DATABASE / USER.

use crate::error::ConfigResult;
use crate::validation::{validate_database_url, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "mysql://root@127.0.0.1:3306/sitehub", "sqlite::memory:")
    pub url: String,

    /// Maximum number of database connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections in the pool
    pub min_connections: u32,

    /// Connection and acquire timeout
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub connection_timeout: Duration,

    /// Idle timeout for connections
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mysql://root@127.0.0.1:3306/sitehub".to_string(),
            max_connections: 10,
            min_connections: 2,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    /// Defaults for the administrative connection: one connection, never shared
    /// with tenant pools.
    pub fn admin_default() -> Self {
        Self {
            url: "mysql://root@127.0.0.1:3306/mysql".to_string(),
            max_connections: 1,
            min_connections: 1,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl Validatable for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_database_url(&self.url, "url", self.domain_name())?;
        validate_positive(self.max_connections, "max_connections", self.domain_name())?;
        validate_positive(self.connection_timeout.as_secs(), "connection_timeout", self.domain_name())?;

        if self.min_connections > self.max_connections {
            return Err(self.validation_error("min_connections cannot be greater than max_connections"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "database"
    }
}
