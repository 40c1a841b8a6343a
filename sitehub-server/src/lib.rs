//! Sitehub server
//!
//! Wires the configuration, registry, provisioning, tenant pools and the
//! resolution middleware into one axum application.

pub mod handlers;
pub mod logging;
pub mod services;
pub mod startup;

pub use services::ServiceContainer;
pub use startup::{build_router, Server};
