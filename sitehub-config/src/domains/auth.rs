//! Token and host-binding configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// What the resolver does when the request host is not a verified domain of
/// the token's tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostBindingPolicy {
    /// Reject with 403
    #[default]
    Strict,
    /// Log a warning and continue
    Advisory,
}

impl FromStr for HostBindingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(HostBindingPolicy::Strict),
            "advisory" => Ok(HostBindingPolicy::Advisory),
            _ => Err(format!("Invalid host binding policy: {}", s)),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric HS256 signing secret
    pub jwt_secret: String,

    /// Token issuer
    pub issuer: String,

    /// Token lifetime
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub token_expiry: Duration,

    /// Host binding policy applied to every tenant-scoped request
    pub host_binding: HostBindingPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "sitehub".to_string(),
            token_expiry: Duration::from_secs(3600),
            host_binding: HostBindingPolicy::Strict,
        }
    }
}

impl Validatable for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.jwt_secret, "jwt_secret", self.domain_name())?;
        validate_required_string(&self.issuer, "issuer", self.domain_name())?;
        validate_positive(self.token_expiry.as_secs(), "token_expiry", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "auth"
    }
}
