//! Tenant resolution middleware

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sitehub_tenancy::TenantResolver;
use tracing::debug;

use crate::errors::ApiError;

/// Resolve the bearer token and host to a tenant and attach the
/// [`TenantContext`](sitehub_tenancy::TenantContext) to the request.
///
/// Any failure ends the request here; nothing partial reaches the handler.
///
/// ```ignore
/// let tenant_routes = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn_with_state(resolver, tenant_resolution_middleware));
/// ```
pub async fn tenant_resolution_middleware(
    State(resolver): State<Arc<TenantResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .map(str::to_owned);

    match resolver.resolve(authorization.as_deref(), host.as_deref()).await {
        Ok(context) => {
            debug!(tenant_id = context.tenant.id, "Tenant context attached");
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            debug!("Tenant resolution rejected: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
