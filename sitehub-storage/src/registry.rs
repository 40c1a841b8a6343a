//! Control-plane tenant registry
//!
//! `TenantRegistry` is a borrowed view over any [`ConnectionTrait`], so the same
//! queries run against the pooled connection or inside an onboarding
//! transaction. Soft-deleted tenants are invisible to every lookup except the
//! uniqueness probes, which must still see them to avoid reusing identifiers.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::entities::{domains, tenants, DomainKind, Domains, Tenants};
use crate::error::{StorageError, StorageResult};

/// Values for a new tenant row
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub company_name: String,
    pub tenant_key: String,
    pub db_name: String,
    pub subdomain: String,
    pub preferred_subdomain: Option<String>,
    pub email: String,
    pub phone: String,
    /// Already hashed
    pub password_hash: String,
    pub image: Option<String>,
}

/// Values for a new domain binding
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub tenant_id: i32,
    pub host: String,
    pub kind: DomainKind,
    pub verified: bool,
}

/// Tenant and domain queries over a borrowed connection
pub struct TenantRegistry<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> TenantRegistry<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// True if any tenant row, deleted or not, uses this key
    pub async fn tenant_key_exists(&self, tenant_key: &str) -> StorageResult<bool> {
        let count = Tenants::find()
            .filter(tenants::Column::TenantKey.eq(tenant_key))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// True if the fully qualified host is taken, either as a tenant's managed
    /// subdomain (deleted rows included) or as any domain binding
    pub async fn subdomain_exists(&self, host: &str) -> StorageResult<bool> {
        let host = host.to_ascii_lowercase();
        let tenants = Tenants::find()
            .filter(tenants::Column::Subdomain.eq(host.as_str()))
            .count(self.conn)
            .await?;
        if tenants > 0 {
            return Ok(true);
        }
        self.domain_exists(&host).await
    }

    /// True if a domain row is bound to this hostname
    pub async fn domain_exists(&self, host: &str) -> StorageResult<bool> {
        let count = Domains::find()
            .filter(domains::Column::Host.eq(host.to_ascii_lowercase()))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// True if any tenant row, deleted or not, was registered with this email
    pub async fn email_exists(&self, email: &str) -> StorageResult<bool> {
        let count = Tenants::find()
            .filter(tenants::Column::Email.eq(email))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Insert a tenant row with `db_url` still unset
    pub async fn insert_tenant(&self, new: NewTenant) -> StorageResult<tenants::Model> {
        let now = Utc::now();
        let model = tenants::ActiveModel {
            name: Set(new.name),
            company_name: Set(new.company_name),
            tenant_key: Set(new.tenant_key),
            db_name: Set(new.db_name),
            subdomain: Set(new.subdomain),
            preferred_subdomain: Set(new.preferred_subdomain),
            email: Set(new.email),
            phone: Set(new.phone),
            password: Set(new.password_hash),
            image: Set(new.image),
            db_url: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let tenant = model.insert(self.conn).await?;
        debug!(tenant_id = tenant.id, tenant_key = %tenant.tenant_key, "Inserted tenant row");
        Ok(tenant)
    }

    /// Record the tenant's connection string once provisioning succeeded
    pub async fn set_db_url(&self, tenant_id: i32, db_url: String) -> StorageResult<tenants::Model> {
        let tenant = self.require_tenant(tenant_id).await?;
        let mut active: tenants::ActiveModel = tenant.into();
        active.db_url = Set(Some(db_url));
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    /// Find a live (not soft-deleted) tenant by id
    pub async fn find_tenant(&self, tenant_id: i32) -> StorageResult<Option<tenants::Model>> {
        Ok(Tenants::find_by_id(tenant_id)
            .filter(tenants::Column::DeletedAt.is_null())
            .one(self.conn)
            .await?)
    }

    /// Find a tenant row whether or not it has been soft-deleted
    pub async fn find_tenant_including_deleted(&self, tenant_id: i32) -> StorageResult<Option<tenants::Model>> {
        Ok(Tenants::find_by_id(tenant_id).one(self.conn).await?)
    }

    /// Find a live tenant that is also flagged active
    pub async fn find_active_tenant(&self, tenant_id: i32) -> StorageResult<Option<tenants::Model>> {
        Ok(self.find_tenant(tenant_id).await?.filter(|t| t.is_active))
    }

    /// Find a live tenant by its login email
    pub async fn find_by_email(&self, email: &str) -> StorageResult<Option<tenants::Model>> {
        Ok(Tenants::find()
            .filter(tenants::Column::Email.eq(email))
            .filter(tenants::Column::DeletedAt.is_null())
            .one(self.conn)
            .await?)
    }

    pub async fn list_tenants(&self, include_deleted: bool) -> StorageResult<Vec<tenants::Model>> {
        let mut query = Tenants::find().order_by_asc(tenants::Column::Id);
        if !include_deleted {
            query = query.filter(tenants::Column::DeletedAt.is_null());
        }
        Ok(query.all(self.conn).await?)
    }

    /// Mark a tenant deleted and inactive. The row and its database are kept.
    pub async fn soft_delete_tenant(&self, tenant_id: i32) -> StorageResult<tenants::Model> {
        let tenant = self.require_tenant(tenant_id).await?;
        let now = Utc::now();
        let mut active: tenants::ActiveModel = tenant.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        let tenant = active.update(self.conn).await?;
        debug!(tenant_id, "Soft-deleted tenant");
        Ok(tenant)
    }

    pub async fn insert_domain(&self, new: NewDomain) -> StorageResult<domains::Model> {
        let now = Utc::now();
        let model = domains::ActiveModel {
            tenant_id: Set(new.tenant_id),
            host: Set(new.host.to_ascii_lowercase()),
            kind: Set(new.kind),
            verified: Set(new.verified),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    /// Verified domain binding for `host` owned by `tenant_id`, if any
    pub async fn find_verified_domain(&self, tenant_id: i32, host: &str) -> StorageResult<Option<domains::Model>> {
        Ok(Domains::find()
            .filter(domains::Column::TenantId.eq(tenant_id))
            .filter(domains::Column::Host.eq(host.to_ascii_lowercase()))
            .filter(domains::Column::Verified.eq(true))
            .one(self.conn)
            .await?)
    }

    pub async fn list_domains(&self, tenant_id: i32) -> StorageResult<Vec<domains::Model>> {
        Ok(Domains::find()
            .filter(domains::Column::TenantId.eq(tenant_id))
            .order_by_asc(domains::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn mark_domain_verified(&self, domain_id: i32) -> StorageResult<domains::Model> {
        let domain = Domains::find_by_id(domain_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| StorageError::not_found("domain", domain_id))?;
        let mut active: domains::ActiveModel = domain.into();
        active.verified = Set(true);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    async fn require_tenant(&self, tenant_id: i32) -> StorageResult<tenants::Model> {
        self.find_tenant(tenant_id)
            .await?
            .ok_or_else(|| StorageError::not_found("tenant", tenant_id))
    }
}
