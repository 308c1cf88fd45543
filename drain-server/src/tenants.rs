use std::collections::HashMap;
use std::sync::Arc;

use drain_config::TenantConfig;
use drain_metrics::TenantContext;
use subtle::ConstantTimeEq;

#[derive(Debug)]
struct TenantEntry {
    password: Vec<u8>,
    context: Arc<TenantContext>,
}

/// The tenants allowed to send logs, indexed by name.
///
/// Built once at startup and shared read-only by all requests.
#[derive(Debug, Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, TenantEntry>,
}

impl TenantRegistry {
    /// Builds the registry from the configured tenants.
    pub fn from_config(tenants: &[TenantConfig]) -> Self {
        let tenants = tenants
            .iter()
            .map(|tenant| {
                let context = TenantContext::new(
                    tenant.name.as_str(),
                    tenant.tags.iter().map(String::as_str),
                    &tenant.prefix,
                );

                let entry = TenantEntry {
                    password: tenant.password.as_bytes().to_vec(),
                    context: Arc::new(context),
                };

                (tenant.name.clone(), entry)
            })
            .collect();

        Self { tenants }
    }

    /// Resolves credentials to the tenant they belong to.
    ///
    /// Passwords are compared in constant time.
    pub fn authenticate(&self, name: &str, password: &str) -> Option<Arc<TenantContext>> {
        let entry = self.tenants.get(name)?;
        let matches: bool = entry.password.ct_eq(password.as_bytes()).into();
        matches.then(|| Arc::clone(&entry.context))
    }

    /// Returns the number of tenants.
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    /// Returns `true` if no tenant is allowed.
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TenantRegistry {
        TenantRegistry::from_config(&[TenantConfig {
            name: "myapp".to_owned(),
            password: "secret".to_owned(),
            tags: vec!["env:prod".to_owned()],
            prefix: "acme".to_owned(),
        }])
    }

    #[test]
    fn test_authenticate() {
        let tenant = registry().authenticate("myapp", "secret").unwrap();

        assert_eq!(tenant.tenant_id(), "myapp");
        assert_eq!(tenant.metric_prefix(), "acme.");
        assert_eq!(tenant.tags().to_string(), "app:myapp,env:prod");
    }

    #[test]
    fn test_wrong_password() {
        let registry = registry();
        assert!(registry.authenticate("myapp", "secre").is_none());
        assert!(registry.authenticate("myapp", "").is_none());
    }

    #[test]
    fn test_unknown_tenant() {
        assert!(registry().authenticate("other", "secret").is_none());
    }
}
