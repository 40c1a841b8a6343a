//! Tenant provisioning configuration

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_port_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest generated database password the service will accept
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Host the tenant database user is scoped to, and the host written into
    /// tenant connection strings
    pub db_host: String,

    /// Port written into tenant connection strings
    pub db_port: u16,

    /// Connection string scheme
    pub scheme: String,

    /// Suffix appended to managed subdomain labels
    pub base_domain: String,

    /// Length of generated tenant database passwords
    pub password_length: usize,

    /// Client-side timeout applied to each administrative statement
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub statement_timeout: Duration,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            db_host: "127.0.0.1".to_string(),
            db_port: 3306,
            scheme: "mysql".to_string(),
            base_domain: "yourdomain.com".to_string(),
            password_length: 24,
            statement_timeout: Duration::from_secs(30),
        }
    }
}

impl Validatable for ProvisioningConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.db_host, "db_host", self.domain_name())?;
        validate_port_range(self.db_port, "db_port", self.domain_name())?;
        validate_enum_choice(&self.scheme, &["mysql"], "scheme", self.domain_name())?;
        validate_required_string(&self.base_domain, "base_domain", self.domain_name())?;

        if self.db_host == "%" || self.db_host.contains('*') {
            return Err(self.validation_error("db_host must name a concrete host, wildcards are not allowed"));
        }

        if !self.base_domain.contains('.') || self.base_domain.starts_with('.') {
            return Err(self.validation_error(format!(
                "base_domain '{}' must be a fully qualified domain",
                self.base_domain
            )));
        }

        if self.password_length < MIN_PASSWORD_LENGTH {
            return Err(self.validation_error(format!(
                "password_length must be at least {}, got {}",
                MIN_PASSWORD_LENGTH, self.password_length
            )));
        }

        if self.statement_timeout.is_zero() {
            return Err(self.validation_error("statement_timeout must be greater than 0"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "provisioning"
    }
}
