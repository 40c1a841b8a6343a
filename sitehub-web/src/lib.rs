//! # Sitehub Web Utilities
//!
//! HTTP plumbing shared by sitehub routes: the `{status, message, errors?}`
//! envelope, conversions from tenancy errors to status codes, and the
//! tenant-resolution middleware that puts a [`TenantContext`] on every
//! tenant-scoped request.

pub mod errors;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use errors::{set_expose_internal_errors, ApiError, ApiResult};
pub use extractors::Tenant;
pub use middleware::tenant_resolution_middleware;
pub use response::ApiResponse;

pub use sitehub_tenancy::{JwtManager, TenantContext};
