mod common;

use std::collections::HashSet;
use std::sync::Arc;

use sitehub_config::PoolConfig;
use sitehub_storage::{DatabaseConnection, DomainKind, TenantRegistry};
use sitehub_tenancy::{
    CreateTenantRequest, OnboardingError, ProvisionError, SchemaModelBinder, TenantOnboarding, TenantPoolManager,
};

use common::{provisioner, registry_db, RecordingExecutor, RecordingRunner};

struct Harness {
    _dir: tempfile::TempDir,
    registry: DatabaseConnection,
    onboarding: TenantOnboarding,
    executor: Arc<RecordingExecutor>,
    runner: Arc<RecordingRunner>,
}

async fn harness(executor: RecordingExecutor) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_db(&dir).await;
    let executor = Arc::new(executor);
    let runner = Arc::new(RecordingRunner::default());
    let provisioner = Arc::new(provisioner(executor.clone(), runner.clone()));
    let pool = Arc::new(TenantPoolManager::new(PoolConfig::default(), Arc::new(SchemaModelBinder)));
    let onboarding =
        TenantOnboarding::new(registry.get_connection().clone(), provisioner, pool).with_bcrypt_cost(4);

    Harness {
        _dir: dir,
        registry,
        onboarding,
        executor,
        runner,
    }
}

fn request(email: &str, company: &str, preferred: Option<&str>) -> CreateTenantRequest {
    CreateTenantRequest {
        name: Some("Jane Doe".to_string()),
        password: Some("s3cret-pass".to_string()),
        email: Some(email.to_string()),
        phone: Some("+15550100".to_string()),
        image: None,
        company_name: Some(company.to_string()),
        preferred_subdomain: preferred.map(str::to_string),
    }
}

#[tokio::test]
async fn test_create_tenant_persists_row_domain_and_url() {
    let h = harness(RecordingExecutor::default()).await;

    let tenant = h
        .onboarding
        .create_tenant(request("Jane@Acme.test", "Acme Inc", Some("acme")))
        .await
        .unwrap();

    assert_eq!(tenant.tenant_key, "acme");
    assert_eq!(tenant.db_name, "t_acme");
    assert_eq!(tenant.subdomain, "acme.sitehub.test");
    assert_eq!(tenant.email, "jane@acme.test");
    assert!(tenant.is_active);

    let db_url = tenant.db_url.clone().unwrap();
    assert!(db_url.starts_with("mysql://u_t_acme:"));
    assert_eq!(h.runner.urls(), vec![db_url]);
    assert_eq!(h.executor.statements().len(), 5);

    assert_ne!(tenant.password, "s3cret-pass");
    assert!(bcrypt::verify("s3cret-pass", &tenant.password).unwrap());
    let json = serde_json::to_value(&tenant).unwrap();
    assert!(json.get("password").is_none());

    let registry = TenantRegistry::new(h.registry.get_connection());
    let stored = registry.find_tenant(tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.db_url, tenant.db_url);

    let domain = registry
        .find_verified_domain(tenant.id, "acme.sitehub.test")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(domain.kind, DomainKind::ManagedSubdomain);
}

#[tokio::test]
async fn test_provisioning_failure_leaves_no_rows() {
    let h = harness(RecordingExecutor::failing_on("GRANT")).await;

    let err = h
        .onboarding
        .create_tenant(request("jane@acme.test", "Acme Inc", Some("acme")))
        .await
        .unwrap_err();
    assert!(matches!(err, OnboardingError::Provision(ProvisionError::Statement(_))));

    let registry = TenantRegistry::new(h.registry.get_connection());
    assert!(registry.list_tenants(true).await.unwrap().is_empty());
    assert!(!registry.domain_exists("acme.sitehub.test").await.unwrap());
    assert!(h.runner.urls().is_empty());
}

#[tokio::test]
async fn test_colliding_requests_get_distinct_identifiers() {
    let h = harness(RecordingExecutor::default()).await;

    let mut keys = HashSet::new();
    let mut hosts = HashSet::new();
    for i in 0..3 {
        let tenant = h
            .onboarding
            .create_tenant(request(&format!("owner{i}@acme.test"), "Acme Inc", Some("acme")))
            .await
            .unwrap();
        assert!(keys.insert(tenant.tenant_key.clone()));
        assert!(hosts.insert(tenant.subdomain.clone()));
    }

    assert!(keys.contains("acme") && keys.contains("acme_1") && keys.contains("acme_2"));
    assert!(hosts.contains("acme.sitehub.test"));
    assert!(hosts.contains("acme-1.sitehub.test"));
    assert!(hosts.contains("acme-2.sitehub.test"));
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let h = harness(RecordingExecutor::default()).await;

    h.onboarding
        .create_tenant(request("jane@acme.test", "Acme Inc", None))
        .await
        .unwrap();
    let err = h
        .onboarding
        .create_tenant(request("JANE@acme.test", "Other Co", None))
        .await
        .unwrap_err();
    assert!(matches!(err, OnboardingError::EmailTaken));
}

#[tokio::test]
async fn test_missing_fields_are_reported() {
    let h = harness(RecordingExecutor::default()).await;

    let mut incomplete = request("jane@acme.test", "Acme Inc", None);
    incomplete.phone = None;
    let err = h.onboarding.create_tenant(incomplete).await.unwrap_err();
    assert!(matches!(err, OnboardingError::MissingFields(ref fields) if fields == &vec!["phone"]));
    assert!(h.executor.statements().is_empty());
}

#[tokio::test]
async fn test_offboard_soft_deletes_and_drops() {
    let h = harness(RecordingExecutor::default()).await;
    let tenant = h
        .onboarding
        .create_tenant(request("jane@acme.test", "Acme Inc", Some("acme")))
        .await
        .unwrap();

    let removed = h.onboarding.offboard_tenant(tenant.id, true).await.unwrap();
    assert!(!removed.is_active);
    assert!(removed.deleted_at.is_some());

    let statements = h.executor.statements();
    assert_eq!(statements[statements.len() - 3], "DROP DATABASE IF EXISTS `t_acme`;");

    let registry = TenantRegistry::new(h.registry.get_connection());
    assert!(registry.find_tenant(tenant.id).await.unwrap().is_none());

    let err = h.onboarding.offboard_tenant(tenant.id, false).await.unwrap_err();
    assert!(matches!(err, OnboardingError::TenantNotFound(id) if id == tenant.id));
}

#[tokio::test]
async fn test_offboard_without_drop_keeps_database() {
    let h = harness(RecordingExecutor::default()).await;
    let tenant = h
        .onboarding
        .create_tenant(request("jane@acme.test", "Acme Inc", None))
        .await
        .unwrap();
    let before = h.executor.statements().len();

    h.onboarding.offboard_tenant(tenant.id, false).await.unwrap();
    assert_eq!(h.executor.statements().len(), before);
}

fn created_users(statements: &[String]) -> Vec<String> {
    statements
        .iter()
        .filter(|s| s.starts_with("CREATE USER"))
        .filter_map(|s| s.split('\'').nth(1).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_long_colliding_names_get_distinct_database_users() {
    let h = harness(RecordingExecutor::default()).await;
    let company = "International Business Machines Corporation";

    let first = h
        .onboarding
        .create_tenant(request("one@ibm.test", company, None))
        .await
        .unwrap();
    let second = h
        .onboarding
        .create_tenant(request("two@ibm.test", company, None))
        .await
        .unwrap();
    assert_ne!(first.db_name, second.db_name);

    let users = created_users(&h.executor.statements());
    assert_eq!(users.len(), 2);
    assert_ne!(users[0], users[1]);
    assert!(users.iter().all(|u| u.chars().count() <= 32));

    let first_url = first.db_url.unwrap();
    let second_url = second.db_url.unwrap();
    assert!(first_url.contains(&format!("//{}:", users[0])));
    assert!(second_url.contains(&format!("//{}:", users[1])));
}

#[tokio::test]
async fn test_failed_drop_can_be_retried() {
    let h = harness(RecordingExecutor::failing_on("DROP DATABASE")).await;
    let tenant = h
        .onboarding
        .create_tenant(request("jane@acme.test", "Acme Inc", Some("acme")))
        .await
        .unwrap();

    let err = h.onboarding.offboard_tenant(tenant.id, true).await.unwrap_err();
    assert!(matches!(err, OnboardingError::Provision(ProvisionError::Statement(_))));

    let registry = TenantRegistry::new(h.registry.get_connection());
    assert!(registry.find_tenant(tenant.id).await.unwrap().is_none());

    h.executor.recover();
    let removed = h.onboarding.offboard_tenant(tenant.id, true).await.unwrap();
    assert_eq!(removed.id, tenant.id);

    let drops: Vec<String> = h
        .executor
        .statements()
        .into_iter()
        .filter(|s| s.starts_with("DROP"))
        .collect();
    assert_eq!(
        drops,
        vec![
            "DROP DATABASE IF EXISTS `t_acme`;".to_string(),
            "DROP DATABASE IF EXISTS `t_acme`;".to_string(),
            "DROP USER IF EXISTS 'u_t_acme'@'127.0.0.1';".to_string(),
        ]
    );

    // Without a drop there is nothing left to do for a removed tenant
    let err = h.onboarding.offboard_tenant(tenant.id, false).await.unwrap_err();
    assert!(matches!(err, OnboardingError::TenantNotFound(id) if id == tenant.id));
}
