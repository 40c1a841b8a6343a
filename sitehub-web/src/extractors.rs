//! Extractors for tenant-scoped handlers

use axum::{extract::FromRequestParts, http::request::Parts};
use sitehub_tenancy::TenantContext;

use crate::errors::ApiError;

/// Resolved tenant context, placed in request extensions by
/// [`tenant_resolution_middleware`](crate::middleware::tenant_resolution_middleware)
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(Tenant)
            .ok_or_else(|| ApiError::internal("Tenant context not found. Ensure tenant resolution middleware is enabled."))
    }
}
