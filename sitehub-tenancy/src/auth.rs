//! Control-plane login

use std::sync::Arc;

use sea_orm::DatabaseConnection as SeaConnection;
use sitehub_storage::{Tenant, TenantRegistry};
use tracing::{debug, info};

use crate::error::AuthError;
use crate::token::JwtManager;

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: u64,
    pub tenant: Tenant,
}

/// Verifies tenant owner credentials and issues tokens
pub struct TenantAuthenticator {
    registry: SeaConnection,
    jwt: Arc<JwtManager>,
}

impl TenantAuthenticator {
    pub fn new(registry: SeaConnection, jwt: Arc<JwtManager>) -> Self {
        Self { registry, jwt }
    }

    /// Unknown email, inactive tenant and wrong password are indistinguishable
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        let tenant = TenantRegistry::new(&self.registry)
            .find_by_email(&email)
            .await?
            .filter(|t| t.is_active);

        let Some(tenant) = tenant else {
            debug!("Login for unknown or inactive tenant");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = tenant.password.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        if !matches {
            debug!(tenant_id = tenant.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .jwt
            .issue(tenant.id, &tenant.email)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        info!(tenant_id = tenant.id, tenant_key = %tenant.tenant_key, "Tenant logged in");

        Ok(LoginOutcome {
            token,
            expires_in: self.jwt.token_expiry().as_secs(),
            tenant,
        })
    }
}
