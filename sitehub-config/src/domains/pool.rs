//! Tenant connection pool configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-tenant pool sizing and idle pruning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum connections in each tenant pool
    pub max_connections: u32,

    /// Minimum connections kept open in each tenant pool
    pub min_connections: u32,

    /// How long a request waits for a pooled connection before failing
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub acquire_timeout: Duration,

    /// Idle timeout for individual connections inside a pool
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub idle_timeout: Duration,

    /// A whole tenant pool unused for longer than this is pruned
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub max_idle: Duration,

    /// How often the pruner runs
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub prune_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10),
            max_idle: Duration::from_secs(15 * 60),
            prune_interval: Duration::from_secs(60),
        }
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_connections, "max_connections", self.domain_name())?;
        validate_positive(self.acquire_timeout.as_secs(), "acquire_timeout", self.domain_name())?;
        validate_positive(self.max_idle.as_secs(), "max_idle", self.domain_name())?;
        validate_positive(self.prune_interval.as_secs(), "prune_interval", self.domain_name())?;

        if self.min_connections > self.max_connections {
            return Err(self.validation_error("min_connections cannot be greater than max_connections"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "pool"
    }
}
