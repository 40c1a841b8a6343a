//! Storage layer for sitehub
//!
//! Holds the control-plane registry (tenants and their domain bindings), the
//! migrations for the registry database and for every tenant database, and a
//! thin connection wrapper shared by the server and the provisioning service.

pub mod connection;
pub mod entities;
pub mod error;
pub mod migrations;
pub mod registry;

pub use connection::{redact_database_url, DatabaseConnection};
pub use entities::*;
pub use error::{StorageError, StorageResult};
pub use migrations::tenant::SEED_OWNER_EMAIL;
pub use migrations::{RegistryMigrator, TenantMigrator};
pub use registry::{NewDomain, NewTenant, TenantRegistry};

// Re-export common SeaORM types for convenience
pub use sea_orm::{
    ConnectionTrait, DatabaseConnection as SeaOrmConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
pub use sea_orm_migration::MigratorTrait;
