use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_table;
mod m20250901_000002_seed_owner_user;

/// Email of the owner row seeded into every tenant database
pub const SEED_OWNER_EMAIL: &str = "owner@example.com";

/// Baseline schema for a tenant database
///
/// Applied versions are tracked in the tenant's own `migrations` table, so
/// re-running against an already provisioned database is a no-op.
pub struct TenantMigrator;

#[async_trait::async_trait]
impl MigratorTrait for TenantMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_table::Migration),
            Box::new(m20250901_000002_seed_owner_user::Migration),
        ]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("migrations").into_iden()
    }
}
