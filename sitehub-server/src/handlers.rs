//! HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sitehub_storage::{Tenant as TenantRecord, TenantRegistry};
use sitehub_tenancy::{AuthUser, CreateTenantRequest, PoolError, TenantIdentity};
use sitehub_web::{ApiError, ApiResponse, ApiResult, Tenant};
use tracing::warn;

use crate::services::ServiceContainer;

pub type AppState = Arc<ServiceContainer>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub tenant: TenantRecord,
}

/// `POST /api/auth/login`
pub async fn login(
    State(services): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let Json(request) = payload?;

    let mut missing = Vec::new();
    if request.email.trim().is_empty() {
        missing.push("email is required".to_string());
    }
    if request.password.is_empty() {
        missing.push("password is required".to_string());
    }
    if !missing.is_empty() {
        return Err(ApiError::validation("Validation failed", missing));
    }

    let outcome = services.authenticator.login(&request.email, &request.password).await?;
    Ok(ApiResponse::ok(LoginResponse {
        token: outcome.token,
        token_type: "Bearer",
        expires_in: outcome.expires_in,
        tenant: outcome.tenant,
    })
    .with_message("Login successful"))
}

/// `GET /api/tenants`
pub async fn list_tenants(State(services): State<AppState>) -> ApiResult<ApiResponse<Vec<TenantRecord>>> {
    let tenants = TenantRegistry::new(services.registry.get_connection())
        .list_tenants(false)
        .await?;
    Ok(ApiResponse::ok(tenants))
}

/// `POST /api/tenants`
pub async fn create_tenant(
    State(services): State<AppState>,
    payload: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TenantRecord>> {
    let Json(request) = payload?;
    let tenant = services.onboarding.create_tenant(request).await?;
    Ok(ApiResponse::created(tenant).with_message("Tenant created"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteTenantQuery {
    pub drop_database: bool,
}

/// `DELETE /api/tenants/{id}`
pub async fn delete_tenant(
    State(services): State<AppState>,
    Path(tenant_id): Path<i32>,
    Query(query): Query<DeleteTenantQuery>,
) -> ApiResult<ApiResponse<TenantRecord>> {
    let tenant = services
        .onboarding
        .offboard_tenant(tenant_id, query.drop_database)
        .await?;
    Ok(ApiResponse::ok(tenant).with_message("Tenant removed"))
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub tenant: TenantIdentity,
    pub user: AuthUser,
    pub users: u64,
    pub migrations: Vec<String>,
}

/// `GET /api/me`, behind the tenant resolution middleware
pub async fn me(Tenant(ctx): Tenant) -> ApiResult<ApiResponse<Profile>> {
    ctx.connection.ping().await.map_err(PoolError::from)?;
    let users = ctx.models.count_users().await?;

    Ok(ApiResponse::ok(Profile {
        tenant: ctx.tenant,
        user: ctx.user,
        users,
        migrations: ctx.models.applied_migrations().to_vec(),
    }))
}

/// `GET /health`
pub async fn health(State(services): State<AppState>) -> impl IntoResponse {
    let registry_ok = match services.registry.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Registry health check failed: {}", e);
            false
        }
    };
    let status = if registry_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if registry_ok { "ok" } else { "degraded" },
            "registry": registry_ok,
            "tenant_pools": services.pool.len(),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
