//! Cross-cutting service plumbing: errors, health checks, middleware,
//! serde helpers, sea-orm extensions and tracing setup.

pub mod error;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
