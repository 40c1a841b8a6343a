pub mod tenant;

pub use tenant::tenant_resolution_middleware;
