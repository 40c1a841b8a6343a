//! Request-to-tenant resolution
//!
//! `TenantResolver::resolve` walks a request from bearer token to a ready
//! [`TenantContext`]. It knows nothing about HTTP beyond the two header values
//! it is handed, so any transport can reuse it.

use std::sync::Arc;

use sea_orm::DatabaseConnection as SeaConnection;
use serde::Serialize;
use sitehub_config::HostBindingPolicy;
use sitehub_storage::{Tenant, TenantRegistry};
use tracing::{debug, warn};

use crate::error::{PoolError, ResolveError};
use crate::pool::{TenantModels, TenantPoolManager};
use crate::token::JwtManager;

/// Public identity of the resolved tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantIdentity {
    pub id: i32,
    pub name: String,
    pub company_name: String,
    pub tenant_key: String,
    pub db_name: String,
    pub subdomain: String,
}

impl From<&Tenant> for TenantIdentity {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            company_name: tenant.company_name.clone(),
            tenant_key: tenant.tenant_key.clone(),
            db_name: tenant.db_name.clone(),
            subdomain: tenant.subdomain.clone(),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub email: String,
    pub tenant_id: i32,
}

/// Everything a tenant-scoped handler needs
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: TenantIdentity,
    pub connection: SeaConnection,
    pub models: Arc<TenantModels>,
    pub user: AuthUser,
}

/// Strip any port and trailing dot, lowercase.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        // [v6]:port
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        host.split(':').next().unwrap_or(host)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

fn bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub struct TenantResolver {
    registry: SeaConnection,
    pool: Arc<TenantPoolManager>,
    jwt: Arc<JwtManager>,
    host_binding: HostBindingPolicy,
}

impl TenantResolver {
    pub fn new(
        registry: SeaConnection,
        pool: Arc<TenantPoolManager>,
        jwt: Arc<JwtManager>,
        host_binding: HostBindingPolicy,
    ) -> Self {
        Self {
            registry,
            pool,
            jwt,
            host_binding,
        }
    }

    pub fn host_binding(&self) -> HostBindingPolicy {
        self.host_binding
    }

    /// Resolve the raw `Authorization` and `Host` header values to a tenant context.
    pub async fn resolve(&self, authorization: Option<&str>, host: Option<&str>) -> Result<TenantContext, ResolveError> {
        let token = authorization.and_then(bearer_token).ok_or(ResolveError::MissingToken)?;
        let claims = self.jwt.verify(token)?;

        let registry = TenantRegistry::new(&self.registry);
        let tenant = registry.find_active_tenant(claims.tid).await?.ok_or_else(|| {
            warn!(tenant_id = claims.tid, "Token for missing or inactive tenant");
            ResolveError::TenantUnavailable
        })?;

        let db_url = match tenant.db_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => {
                warn!(tenant_id = tenant.id, tenant_key = %tenant.tenant_key, "Tenant has no database yet");
                return Err(ResolveError::NotProvisioned);
            }
        };

        self.check_host(&registry, &tenant, host).await?;

        let handle = self.pool.get_with_models(db_url).await.map_err(|e| match e {
            PoolError::Retired => {
                warn!(tenant_id = tenant.id, "Tenant removed while resolving");
                ResolveError::TenantUnavailable
            }
            other => other.into(),
        })?;
        debug!(tenant_id = tenant.id, tenant_key = %tenant.tenant_key, "Resolved tenant");

        Ok(TenantContext {
            tenant: TenantIdentity::from(&tenant),
            connection: handle.connection,
            models: handle.models,
            user: AuthUser {
                email: claims.sub,
                tenant_id: tenant.id,
            },
        })
    }

    async fn check_host(
        &self,
        registry: &TenantRegistry<'_, SeaConnection>,
        tenant: &Tenant,
        host: Option<&str>,
    ) -> Result<(), ResolveError> {
        let host = host.map(normalize_host).filter(|h| !h.is_empty());
        if let Some(host) = host.as_deref() {
            if registry.find_verified_domain(tenant.id, host).await?.is_some() {
                return Ok(());
            }
        }

        let host = host.as_deref().unwrap_or("<none>");
        match self.host_binding {
            HostBindingPolicy::Strict => {
                warn!(tenant_id = tenant.id, host, "Request host is not a verified domain of the tenant");
                Err(ResolveError::DomainNotMapped)
            }
            HostBindingPolicy::Advisory => {
                warn!(tenant_id = tenant.id, host, "Request host is not a verified domain of the tenant, continuing");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Acme.Example.com:3001"), "acme.example.com");
        assert_eq!(normalize_host("acme.example.com."), "acme.example.com");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host(" localhost "), "localhost");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("abc.def"), None);
    }
}
