//! Router module for the vector ingest pipeline.
//!
//! Assigns records to tenants of a multi-tenant collection.

mod tenant_router;

pub use tenant_router::{default_tenant_pool, TenantRouter, DEFAULT_ROUTING_PROPERTY};
