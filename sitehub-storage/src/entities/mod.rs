pub mod domains;
pub mod tenant_users;
pub mod tenants;

pub use domains::{
    ActiveModel as DomainActiveModel, Column as DomainColumn, DomainKind, Entity as Domains, Model as Domain,
};
pub use tenant_users::{
    ActiveModel as TenantUserActiveModel, Column as TenantUserColumn, Entity as TenantUsers, Model as TenantUser,
};
pub use tenants::{ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenants, Model as Tenant};
