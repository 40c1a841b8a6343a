//! Tenant creation and removal
//!
//! Creation runs inside one registry transaction: the tenant row is inserted
//! without a `db_url`, the database is provisioned, the managed domain is bound,
//! and only then is `db_url` written and the transaction committed. Any failure
//! rolls the registry back, so no tenant row ever carries a `db_url` for a
//! database that was not fully provisioned.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection as SeaConnection, DatabaseTransaction, TransactionTrait};
use serde::Deserialize;
use sitehub_storage::{DomainKind, NewDomain, NewTenant, StorageError, Tenant, TenantRegistry};
use tracing::{info, warn};

use crate::error::OnboardingError;
use crate::identifiers::{generate_identifiers, IdentifierAvailability, IdentifierRequest};
use crate::pool::TenantPoolManager;
use crate::provision::Provisioner;

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Tenant creation input. Fields are optional so that every missing one can be reported.
#[derive(Clone, Default, Deserialize)]
pub struct CreateTenantRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub company_name: Option<String>,
    pub preferred_subdomain: Option<String>,
}

impl fmt::Debug for CreateTenantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateTenantRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("company_name", &self.company_name)
            .field("preferred_subdomain", &self.preferred_subdomain)
            .finish_non_exhaustive()
    }
}

struct ValidatedRequest {
    name: String,
    password: String,
    email: String,
    phone: String,
    image: Option<String>,
    company_name: String,
    preferred_subdomain: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl CreateTenantRequest {
    /// Names of required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("password", &self.password),
            ("email", &self.email),
            ("phone", &self.phone),
            ("company_name", &self.company_name),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(field, _)| field)
        .collect()
    }

    fn validate(self) -> Result<ValidatedRequest, OnboardingError> {
        let missing = self.missing_fields();
        match (
            present(&self.name),
            self.password.filter(|p| !p.trim().is_empty()),
            present(&self.email),
            present(&self.phone),
            present(&self.company_name),
        ) {
            (Some(name), Some(password), Some(email), Some(phone), Some(company_name)) => Ok(ValidatedRequest {
                name,
                password,
                email: email.to_lowercase(),
                phone,
                image: present(&self.image),
                company_name,
                preferred_subdomain: present(&self.preferred_subdomain),
            }),
            _ => Err(OnboardingError::MissingFields(missing)),
        }
    }
}

/// Existence checks answered by the registry inside the creation transaction
struct RegistryAvailability<'a, C> {
    conn: &'a C,
    base_domain: &'a str,
}

#[async_trait]
impl<C: ConnectionTrait + Send + Sync> IdentifierAvailability for RegistryAvailability<'_, C> {
    async fn tenant_key_exists(&self, tenant_key: &str) -> Result<bool, StorageError> {
        TenantRegistry::new(self.conn).tenant_key_exists(tenant_key).await
    }

    async fn subdomain_exists(&self, label: &str) -> Result<bool, StorageError> {
        TenantRegistry::new(self.conn)
            .subdomain_exists(&format!("{label}.{}", self.base_domain))
            .await
    }
}

/// Creates and removes tenants
pub struct TenantOnboarding {
    registry: SeaConnection,
    provisioner: Arc<Provisioner>,
    pool: Arc<TenantPoolManager>,
    bcrypt_cost: u32,
}

impl TenantOnboarding {
    pub fn new(registry: SeaConnection, provisioner: Arc<Provisioner>, pool: Arc<TenantPoolManager>) -> Self {
        Self {
            registry,
            provisioner,
            pool,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Create, provision and bind a new tenant. Returns the committed row.
    pub async fn create_tenant(&self, request: CreateTenantRequest) -> Result<Tenant, OnboardingError> {
        let request = request.validate()?;
        let password_hash = self.hash_password(request.password.clone()).await?;

        let txn = self.registry.begin().await?;
        match self.create_within(&txn, request, password_hash).await {
            Ok(tenant) => {
                txn.commit().await?;
                info!(
                    tenant_id = tenant.id,
                    tenant_key = %tenant.tenant_key,
                    db_name = %tenant.db_name,
                    host = %tenant.subdomain,
                    "Tenant created"
                );
                Ok(tenant)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!("Failed to roll back tenant creation: {}", rollback);
                }
                warn!(error = %e, "Tenant creation failed");
                Err(e)
            }
        }
    }

    async fn create_within(
        &self,
        txn: &DatabaseTransaction,
        request: ValidatedRequest,
        password_hash: String,
    ) -> Result<Tenant, OnboardingError> {
        let registry = TenantRegistry::new(txn);
        if registry.email_exists(&request.email).await? {
            return Err(OnboardingError::EmailTaken);
        }

        let base_domain = self.provisioner.config().base_domain.as_str();
        let availability = RegistryAvailability { conn: txn, base_domain };
        let ids = generate_identifiers(
            &IdentifierRequest {
                company_name: Some(request.company_name.clone()),
                preferred_subdomain: request.preferred_subdomain.clone(),
            },
            &availability,
        )
        .await?;

        let host = format!("{}.{base_domain}", ids.subdomain_label);
        let tenant = registry
            .insert_tenant(NewTenant {
                name: request.name,
                company_name: request.company_name,
                tenant_key: ids.tenant_key.clone(),
                db_name: ids.db_name.clone(),
                subdomain: host.clone(),
                preferred_subdomain: request.preferred_subdomain,
                email: request.email,
                phone: request.phone,
                password_hash,
                image: request.image,
            })
            .await?;

        let provisioned = self.provisioner.provision(&ids.tenant_key, Some(&ids.db_name)).await?;

        registry
            .insert_domain(NewDomain {
                tenant_id: tenant.id,
                host,
                kind: DomainKind::ManagedSubdomain,
                verified: true,
            })
            .await?;

        Ok(registry.set_db_url(tenant.id, provisioned.tenant_db_url).await?)
    }

    /// Soft-delete a tenant, retire its pool, and optionally drop its database.
    ///
    /// A tenant that is already soft-deleted is accepted again when
    /// `drop_database` is set, so a failed drop can be retried.
    pub async fn offboard_tenant(&self, tenant_id: i32, drop_database: bool) -> Result<Tenant, OnboardingError> {
        let registry = TenantRegistry::new(&self.registry);
        let tenant = match registry.find_tenant_including_deleted(tenant_id).await? {
            Some(tenant) if tenant.is_deleted() && drop_database => {
                info!(tenant_id, tenant_key = %tenant.tenant_key, "Retrying removal of deleted tenant");
                tenant
            }
            Some(tenant) if !tenant.is_deleted() => {
                registry.soft_delete_tenant(tenant_id).await.map_err(|e| {
                    if e.is_not_found() {
                        OnboardingError::TenantNotFound(tenant_id)
                    } else {
                        e.into()
                    }
                })?
            }
            _ => return Err(OnboardingError::TenantNotFound(tenant_id)),
        };

        if let Some(db_url) = tenant.db_url.as_deref() {
            if let Err(e) = self.pool.retire(db_url).await {
                warn!(tenant_id, error = %e, "Failed to close tenant pool during removal");
            }
        }

        if drop_database {
            self.provisioner.drop_database(&tenant.db_name).await?;
        }

        info!(tenant_id, tenant_key = %tenant.tenant_key, drop_database, "Tenant removed");
        Ok(tenant)
    }

    async fn hash_password(&self, password: String) -> Result<String, OnboardingError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| OnboardingError::PasswordHash(e.to_string()))?
            .map_err(|e| OnboardingError::PasswordHash(e.to_string()))
    }
}
