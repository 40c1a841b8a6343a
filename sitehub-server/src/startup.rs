//! Server startup and shutdown logic

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sitehub_config::{Environment, SitehubConfig};
use sitehub_web::{set_expose_internal_errors, tenant_resolution_middleware};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::services::ServiceContainer;

/// Build the application router.
///
/// Only the tenant-scoped routes sit behind the resolution middleware; onboarding,
/// login and health are control-plane routes.
pub fn build_router(services: Arc<ServiceContainer>) -> Router {
    let tenant_routes = Router::new()
        .route("/api/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            services.resolver.clone(),
            tenant_resolution_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/tenants", get(handlers::list_tenants).post(handlers::create_tenant))
        .route("/api/tenants/{id}", delete(handlers::delete_tenant))
        .with_state(services.clone())
        .merge(tenant_routes)
        .fallback(handlers::not_found);

    if services.config.server.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

/// Server application struct
pub struct Server {
    services: Arc<ServiceContainer>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: SitehubConfig) -> Result<Self> {
        config.validate_all().context("Invalid configuration")?;
        set_expose_internal_errors(config.server.environment == Environment::Development);

        let services = ServiceContainer::new(&config).await?;
        Ok(Self {
            services: Arc::new(services),
        })
    }

    pub fn services(&self) -> &Arc<ServiceContainer> {
        &self.services
    }

    /// Serve until a shutdown signal arrives, then close every tenant pool.
    pub async fn start(self) -> Result<()> {
        let config = &self.services.config;
        let addr = config.server.socket_address();

        let pruner = self
            .services
            .pool
            .spawn_pruner(config.pool.prune_interval, config.pool.max_idle);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.log_config_summary();
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, build_router(self.services.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        match self.services.pool.shutdown().await {
            Ok(closed) => tracing::info!(closed, "Tenant pools closed"),
            Err(e) => tracing::warn!("Failed to close every tenant pool: {}", e),
        }
        if let Err(e) = pruner.await {
            tracing::warn!("Idle pool pruner ended abnormally: {}", e);
        }
        if let Err(e) = self.services.registry.clone().close().await {
            tracing::warn!("Failed to close registry connection: {}", e);
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn log_config_summary(&self) {
        let config = &self.services.config;
        tracing::info!("=== Sitehub Server Configuration ===");
        tracing::info!("Bind Address: {}", config.server.socket_address());
        tracing::info!("Environment: {:?}", config.server.environment);
        tracing::info!("Base Domain: {}", config.provisioning.base_domain);
        tracing::info!("Host Binding: {:?}", config.auth.host_binding);
        tracing::info!(
            "Tenant Pools: max {} connections, idle after {}s",
            config.pool.max_connections,
            config.pool.max_idle.as_secs()
        );
        tracing::info!("Tracing: {}", if config.server.enable_tracing { "Enabled" } else { "Disabled" });
        tracing::info!("====================================");
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
