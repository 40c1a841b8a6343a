//! Schema migrations
//!
//! `RegistryMigrator` owns the control-plane database. `TenantMigrator` is the
//! baseline applied to every freshly provisioned tenant database.

pub mod registry;
pub mod tenant;

pub use registry::RegistryMigrator;
pub use tenant::TenantMigrator;
