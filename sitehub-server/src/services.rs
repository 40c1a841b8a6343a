//! Service container
//!
//! Owns the long-lived pieces: the registry connection, the administrative
//! connection (wrapped by the provisioner and never handed to handlers), the
//! tenant pool manager and the resolver built on top of them.

use std::sync::Arc;

use anyhow::{Context, Result};
use sitehub_config::SitehubConfig;
use sitehub_storage::{redact_database_url, DatabaseConnection};
use sitehub_tenancy::{
    AdminExecutor, JwtManager, MigrationRunner, Provisioner, SchemaModelBinder, SeaOrmAdminExecutor,
    SeaOrmMigrationRunner, TenantAuthenticator, TenantOnboarding, TenantPoolManager, TenantResolver,
};
use tracing::info;

pub struct ServiceContainer {
    pub config: SitehubConfig,
    pub registry: DatabaseConnection,
    pub pool: Arc<TenantPoolManager>,
    pub jwt: Arc<JwtManager>,
    pub resolver: Arc<TenantResolver>,
    pub onboarding: Arc<TenantOnboarding>,
    pub authenticator: Arc<TenantAuthenticator>,
}

impl ServiceContainer {
    /// Connect to the registry and administrative databases and build every service.
    pub async fn new(config: &SitehubConfig) -> Result<Self> {
        let registry = DatabaseConnection::new(config.registry_database.clone())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to registry database {}",
                    redact_database_url(&config.registry_database.url)
                )
            })?;
        registry
            .migrate_registry()
            .await
            .context("Failed to migrate registry database")?;

        let admin = DatabaseConnection::new(config.admin_database.clone())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to administrative database {}",
                    redact_database_url(&config.admin_database.url)
                )
            })?;
        let executor = Arc::new(SeaOrmAdminExecutor::new(
            admin.get_connection().clone(),
            config.provisioning.statement_timeout,
        ));
        let migrations = Arc::new(SeaOrmMigrationRunner::new(config.pool.acquire_timeout));

        Ok(Self::with_parts(config.clone(), registry, executor, migrations))
    }

    /// Assemble the services over an already connected registry.
    pub fn with_parts(
        config: SitehubConfig,
        registry: DatabaseConnection,
        admin: Arc<dyn AdminExecutor>,
        migrations: Arc<dyn MigrationRunner>,
    ) -> Self {
        let pool = Arc::new(TenantPoolManager::new(config.pool.clone(), Arc::new(SchemaModelBinder)));
        let jwt = Arc::new(JwtManager::new(&config.auth));
        let provisioner = Arc::new(Provisioner::new(config.provisioning.clone(), admin, migrations));

        let resolver = Arc::new(TenantResolver::new(
            registry.get_connection().clone(),
            pool.clone(),
            jwt.clone(),
            config.auth.host_binding,
        ));
        let onboarding = Arc::new(TenantOnboarding::new(
            registry.get_connection().clone(),
            provisioner,
            pool.clone(),
        ));
        let authenticator = Arc::new(TenantAuthenticator::new(registry.get_connection().clone(), jwt.clone()));

        info!(
            host_binding = ?config.auth.host_binding,
            base_domain = %config.provisioning.base_domain,
            "Services initialized"
        );

        Self {
            config,
            registry,
            pool,
            jwt,
            resolver,
            onboarding,
            authenticator,
        }
    }
}
