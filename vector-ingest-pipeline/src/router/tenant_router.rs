//! Tenant router implementation.
//!
//! Derives a tenant from the length of a designated property. The mapping is
//! a pure function of the properties and the pool, so the same record always
//! lands on the same tenant under one configuration.

use tracing::trace;

use crate::errors::IngestError;
use vector_ingest_shared::PropertyMap;

/// Property used to derive the tenant when none is configured.
pub const DEFAULT_ROUTING_PROPERTY: &str = "company_author";

const DEFAULT_TENANT_COUNT: usize = 5;

/// The pool `tenant_0` .. `tenant_4`.
pub fn default_tenant_pool() -> Vec<String> {
    (0..DEFAULT_TENANT_COUNT)
        .map(|i| format!("tenant_{}", i))
        .collect()
}

/// Router that picks a tenant for each record.
#[derive(Debug, Clone)]
pub struct TenantRouter {
    routing_property: String,
    tenant_pool: Vec<String>,
}

impl TenantRouter {
    /// Create a router over `tenant_pool`, keyed on `routing_property`.
    pub fn new(routing_property: impl Into<String>, tenant_pool: Vec<String>) -> Self {
        Self {
            routing_property: routing_property.into(),
            tenant_pool,
        }
    }

    pub fn routing_property(&self) -> &str {
        &self.routing_property
    }

    pub fn tenant_pool(&self) -> &[String] {
        &self.tenant_pool
    }

    /// Check that the router can serve multi-tenant runs.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.tenant_pool.is_empty() {
            return Err(IngestError::config(
                "multi-tenancy is enabled but the tenant pool is empty",
            ));
        }
        Ok(())
    }

    /// Pick the tenant for a record.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Multi-tenancy is disabled
    /// * `Ok(Some(tenant))` - `tenant_pool[len(property) % len(tenant_pool)]`
    /// * `Err(IngestError::RoutingKeyMissingError)` - The routing property is absent or null
    /// * `Err(IngestError::ConfigError)` - The tenant pool is empty
    pub fn route(
        &self,
        properties: &PropertyMap,
        enabled: bool,
    ) -> Result<Option<String>, IngestError> {
        if !enabled {
            return Ok(None);
        }
        self.validate()?;

        let key_len = match properties.get(&self.routing_property) {
            Some(value) if !value.is_null() => match value.as_text() {
                Some(text) => text.chars().count(),
                None => value.to_string().chars().count(),
            },
            _ => return Err(IngestError::routing_key_missing(&self.routing_property)),
        };

        let tenant = &self.tenant_pool[key_len % self.tenant_pool.len()];
        trace!(key_len = key_len, tenant = %tenant, "Routed record");
        Ok(Some(tenant.clone()))
    }
}

impl Default for TenantRouter {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTING_PROPERTY, default_tenant_pool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_ingest_shared::PropertyValue;

    fn author(name: &str) -> PropertyMap {
        let mut properties = PropertyMap::new();
        properties.insert(DEFAULT_ROUTING_PROPERTY.to_string(), name.into());
        properties
    }

    #[test]
    fn test_disabled_returns_none() {
        let router = TenantRouter::default();
        assert_eq!(router.route(&author("Acme"), false).unwrap(), None);
        // the key is not consulted when disabled
        assert_eq!(router.route(&PropertyMap::new(), false).unwrap(), None);
    }

    #[test]
    fn test_routes_by_length() {
        let router = TenantRouter::default();
        assert_eq!(
            router.route(&author("Acme"), true).unwrap().as_deref(),
            Some("tenant_4")
        );
        assert_eq!(
            router.route(&author("Globex"), true).unwrap().as_deref(),
            Some("tenant_1")
        );
        assert_eq!(
            router.route(&author(""), true).unwrap().as_deref(),
            Some("tenant_0")
        );
    }

    #[test]
    fn test_length_counts_characters() {
        let router = TenantRouter::default();
        // 4 characters, 5 bytes
        assert_eq!(
            router.route(&author("Café"), true).unwrap().as_deref(),
            Some("tenant_4")
        );
    }

    #[test]
    fn test_same_properties_same_tenant() {
        let router = TenantRouter::default();
        let properties = author("AmazonHelp");
        let first = router.route(&properties, true).unwrap();
        let second = router.route(&properties, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_key() {
        let router = TenantRouter::default();
        let result = router.route(&PropertyMap::new(), true);
        assert!(matches!(result, Err(IngestError::RoutingKeyMissingError(p)) if p == "company_author"));

        let mut properties = PropertyMap::new();
        properties.insert(DEFAULT_ROUTING_PROPERTY.to_string(), PropertyValue::Null);
        assert!(router.route(&properties, true).is_err());
    }

    #[test]
    fn test_non_text_key_uses_display_length() {
        let router = TenantRouter::new("tweet_id", default_tenant_pool());
        let mut properties = PropertyMap::new();
        properties.insert("tweet_id".to_string(), PropertyValue::Integer(123456));
        assert_eq!(
            router.route(&properties, true).unwrap().as_deref(),
            Some("tenant_1")
        );
    }

    #[test]
    fn test_custom_pool() {
        let router = TenantRouter::new(
            DEFAULT_ROUTING_PROPERTY,
            vec!["east".to_string(), "west".to_string()],
        );
        assert_eq!(router.route(&author("Acme"), true).unwrap().as_deref(), Some("east"));
        assert_eq!(router.route(&author("Bank"), true).unwrap().as_deref(), Some("east"));
        assert_eq!(router.route(&author("Tesco"), true).unwrap().as_deref(), Some("west"));
    }

    #[test]
    fn test_empty_pool_is_config_error() {
        let router = TenantRouter::new(DEFAULT_ROUTING_PROPERTY, Vec::new());
        assert!(matches!(
            router.route(&author("Acme"), true),
            Err(IngestError::ConfigError(_))
        ));
        assert!(router.route(&author("Acme"), false).unwrap().is_none());
    }
}
