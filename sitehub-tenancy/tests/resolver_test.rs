mod common;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use sea_orm_migration::MigratorTrait;
use sitehub_config::{AuthConfig, HostBindingPolicy, PoolConfig};
use sitehub_storage::{
    DatabaseConnection, DomainKind, NewDomain, NewTenant, Tenant, TenantActiveModel, TenantMigrator, TenantRegistry,
};
use sitehub_tenancy::{Claims, JwtManager, ResolveError, SchemaModelBinder, TenantPoolManager, TenantResolver};

use common::{registry_db, sqlite_config, sqlite_url};

struct Harness {
    dir: tempfile::TempDir,
    registry: DatabaseConnection,
    pool: Arc<TenantPoolManager>,
    jwt: Arc<JwtManager>,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_db(&dir).await;
        let pool = Arc::new(TenantPoolManager::new(PoolConfig::default(), Arc::new(SchemaModelBinder)));
        let jwt = Arc::new(JwtManager::new(&AuthConfig {
            jwt_secret: "resolver-test-secret".to_string(),
            ..AuthConfig::default()
        }));
        Self {
            dir,
            registry,
            pool,
            jwt,
        }
    }

    fn resolver(&self, policy: HostBindingPolicy) -> TenantResolver {
        TenantResolver::new(
            self.registry.get_connection().clone(),
            self.pool.clone(),
            self.jwt.clone(),
            policy,
        )
    }

    /// Insert a tenant; when `provisioned`, give it a migrated sqlite database
    async fn tenant(&self, key: &str, provisioned: bool) -> Tenant {
        let registry = TenantRegistry::new(self.registry.get_connection());
        let host = format!("{key}.sitehub.test");
        let tenant = registry
            .insert_tenant(NewTenant {
                name: "Owner".to_string(),
                company_name: key.to_string(),
                tenant_key: key.to_string(),
                db_name: format!("t_{key}"),
                subdomain: host.clone(),
                preferred_subdomain: None,
                email: format!("owner@{key}.test"),
                phone: "+15550100".to_string(),
                password_hash: "unused".to_string(),
                image: None,
            })
            .await
            .unwrap();
        registry
            .insert_domain(NewDomain {
                tenant_id: tenant.id,
                host,
                kind: DomainKind::ManagedSubdomain,
                verified: true,
            })
            .await
            .unwrap();

        if !provisioned {
            return tenant;
        }

        let url = sqlite_url(&self.dir, &format!("t_{key}.db"));
        let db = DatabaseConnection::new(sqlite_config(&url)).await.unwrap();
        TenantMigrator::up(db.get_connection(), None).await.unwrap();
        db.close().await.unwrap();

        registry.set_db_url(tenant.id, url).await.unwrap()
    }

    fn bearer(&self, tenant: &Tenant) -> String {
        format!("Bearer {}", self.jwt.issue(tenant.id, &tenant.email).unwrap())
    }
}

#[tokio::test]
async fn test_missing_or_malformed_authorization() {
    let h = Harness::new().await;
    let resolver = h.resolver(HostBindingPolicy::Strict);

    assert!(matches!(resolver.resolve(None, None).await, Err(ResolveError::MissingToken)));
    assert!(matches!(
        resolver.resolve(Some("Basic dXNlcjpwdw=="), None).await,
        Err(ResolveError::MissingToken)
    ));
    assert!(matches!(
        resolver.resolve(Some("Bearer garbage"), None).await,
        Err(ResolveError::InvalidToken)
    ));
}

#[tokio::test]
async fn test_expired_token() {
    let h = Harness::new().await;
    let tenant = h.tenant("acme", true).await;
    let now = Utc::now().timestamp();
    let token = h
        .jwt
        .sign(&Claims {
            tid: tenant.id,
            sub: tenant.email.clone(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "sitehub".to_string(),
        })
        .unwrap();

    let result = h
        .resolver(HostBindingPolicy::Strict)
        .resolve(Some(&format!("Bearer {token}")), Some("acme.sitehub.test"))
        .await;
    assert!(matches!(result, Err(ResolveError::ExpiredToken)));
}

#[tokio::test]
async fn test_deleted_inactive_and_unknown_tenants() {
    let h = Harness::new().await;
    let resolver = h.resolver(HostBindingPolicy::Strict);

    let deleted = h.tenant("gone", true).await;
    TenantRegistry::new(h.registry.get_connection())
        .soft_delete_tenant(deleted.id)
        .await
        .unwrap();
    let result = resolver.resolve(Some(&h.bearer(&deleted)), Some("gone.sitehub.test")).await;
    assert!(matches!(result, Err(ResolveError::TenantUnavailable)));

    let inactive = h.tenant("paused", true).await;
    let mut active: TenantActiveModel = inactive.clone().into();
    active.is_active = Set(false);
    active.update(h.registry.get_connection()).await.unwrap();
    let result = resolver.resolve(Some(&h.bearer(&inactive)), Some("paused.sitehub.test")).await;
    assert!(matches!(result, Err(ResolveError::TenantUnavailable)));

    let token = format!("Bearer {}", h.jwt.issue(9999, "ghost@nowhere.test").unwrap());
    let result = resolver.resolve(Some(&token), None).await;
    assert!(matches!(result, Err(ResolveError::TenantUnavailable)));
}

#[tokio::test]
async fn test_unprovisioned_tenant() {
    let h = Harness::new().await;
    let tenant = h.tenant("pending", false).await;

    let result = h
        .resolver(HostBindingPolicy::Strict)
        .resolve(Some(&h.bearer(&tenant)), Some("pending.sitehub.test"))
        .await;
    assert!(matches!(result, Err(ResolveError::NotProvisioned)));
    assert!(h.pool.is_empty());
}

#[tokio::test]
async fn test_valid_request_injects_tenant_context() {
    let h = Harness::new().await;
    let acme = h.tenant("acme", true).await;
    let globex = h.tenant("globex", true).await;
    let resolver = h.resolver(HostBindingPolicy::Strict);

    let ctx = resolver
        .resolve(Some(&h.bearer(&acme)), Some("ACME.sitehub.test:3001"))
        .await
        .unwrap();
    assert_eq!(ctx.tenant.id, acme.id);
    assert_eq!(ctx.tenant.tenant_key, "acme");
    assert_eq!(ctx.user.email, acme.email);
    assert_eq!(ctx.user.tenant_id, acme.id);
    assert_eq!(ctx.models.applied_migrations().len(), 2);
    assert_eq!(ctx.models.count_users().await.unwrap(), 1);
    assert!(ctx.models.find_user_by_email("owner@example.com").await.unwrap().is_some());

    let other = resolver
        .resolve(Some(&h.bearer(&globex)), Some("globex.sitehub.test"))
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&ctx.models, &other.models));
    assert_eq!(h.pool.len(), 2);

    // A second request reuses the cached entry
    let again = resolver
        .resolve(Some(&h.bearer(&acme)), Some("acme.sitehub.test"))
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&ctx.models, &again.models));
    assert_eq!(h.pool.connections_opened(), 2);
}

#[tokio::test]
async fn test_strict_host_binding_rejects_foreign_host() {
    let h = Harness::new().await;
    let acme = h.tenant("acme", true).await;
    h.tenant("globex", true).await;
    let resolver = h.resolver(HostBindingPolicy::Strict);

    let result = resolver.resolve(Some(&h.bearer(&acme)), Some("globex.sitehub.test")).await;
    assert!(matches!(result, Err(ResolveError::DomainNotMapped)));

    let result = resolver.resolve(Some(&h.bearer(&acme)), None).await;
    assert!(matches!(result, Err(ResolveError::DomainNotMapped)));
}

#[tokio::test]
async fn test_unverified_domain_is_not_trusted() {
    let h = Harness::new().await;
    let acme = h.tenant("acme", true).await;
    TenantRegistry::new(h.registry.get_connection())
        .insert_domain(NewDomain {
            tenant_id: acme.id,
            host: "shop.acme.test".to_string(),
            kind: DomainKind::CustomDomain,
            verified: false,
        })
        .await
        .unwrap();

    let result = h
        .resolver(HostBindingPolicy::Strict)
        .resolve(Some(&h.bearer(&acme)), Some("shop.acme.test"))
        .await;
    assert!(matches!(result, Err(ResolveError::DomainNotMapped)));
}

#[tokio::test]
async fn test_advisory_host_binding_continues() {
    let h = Harness::new().await;
    let acme = h.tenant("acme", true).await;

    let ctx = h
        .resolver(HostBindingPolicy::Advisory)
        .resolve(Some(&h.bearer(&acme)), Some("unmapped.example.com"))
        .await
        .unwrap();
    assert_eq!(ctx.tenant.id, acme.id);
}

#[tokio::test]
async fn test_pool_retired_mid_removal_is_not_recached() {
    let h = Harness::new().await;
    let tenant = h.tenant("acme", true).await;
    let resolver = h.resolver(HostBindingPolicy::Strict);

    resolver
        .resolve(Some(&h.bearer(&tenant)), Some("acme.sitehub.test"))
        .await
        .unwrap();

    // Removal has retired the pool but the registry row is still visible
    let db_url = tenant.db_url.clone().unwrap();
    assert!(h.pool.retire(&db_url).await.unwrap());

    let result = resolver.resolve(Some(&h.bearer(&tenant)), Some("acme.sitehub.test")).await;
    assert!(matches!(result, Err(ResolveError::TenantUnavailable)));
    assert!(!h.pool.contains(&db_url));
}
