//! Tenant lifecycle and connection management for sitehub
//!
//! Every tenant owns an isolated database, a database user scoped to the
//! application host, and a managed subdomain. This crate derives those
//! identifiers, provisions the database, caches one pooled connection per
//! tenant, and maps authenticated requests onto the right pool.

pub mod auth;
pub mod credentials;
pub mod error;
pub mod identifiers;
pub mod onboarding;
pub mod pool;
pub mod provision;
pub mod resolver;
pub mod token;

pub use auth::{LoginOutcome, TenantAuthenticator};
pub use error::{AuthError, IdentifierError, OnboardingError, PoolError, ProvisionError, ResolveError};
pub use identifiers::{generate_identifiers, IdentifierAvailability, IdentifierRequest, TenantIdentifiers};
pub use onboarding::{CreateTenantRequest, TenantOnboarding};
pub use pool::{ModelBinder, SchemaModelBinder, TenantHandle, TenantModels, TenantPoolManager};
pub use provision::{
    AdminExecutor, MigrationRunner, ProvisionedTenant, Provisioner, SeaOrmAdminExecutor, SeaOrmMigrationRunner,
};
pub use resolver::{normalize_host, AuthUser, TenantContext, TenantIdentity, TenantResolver};
pub use token::{Claims, JwtManager};
