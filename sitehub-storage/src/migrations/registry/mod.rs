use sea_orm_migration::prelude::*;

mod m20250901_000001_create_tenants_table;
mod m20250901_000002_create_domains_table;

pub struct RegistryMigrator;

#[async_trait::async_trait]
impl MigratorTrait for RegistryMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_tenants_table::Migration),
            Box::new(m20250901_000002_create_domains_table::Migration),
        ]
    }
}
