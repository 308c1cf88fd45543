use crate::tags::Tags;

/// Per-request information about the tenant that sent a batch of log lines.
///
/// Resolved once by authentication and shared read-only by all lines of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: String,
    tags: Tags,
    metric_prefix: String,
}

impl TenantContext {
    /// Creates the context for the tenant `name`.
    ///
    /// The tag `app:<name>` is always added to `tags`. A non-empty `prefix` is terminated with a
    /// period if it is not already.
    pub fn new<I, T>(name: impl Into<String>, tags: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tenant_id = name.into();

        let mut tags: Tags = tags.into_iter().collect();
        tags.insert(format!("app:{tenant_id}"));

        let mut metric_prefix = prefix.to_owned();
        if !metric_prefix.is_empty() && !metric_prefix.ends_with('.') {
            metric_prefix.push('.');
        }

        Self {
            tenant_id,
            tags,
            metric_prefix,
        }
    }

    /// The tenant name, which is also the username of its credentials.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Tags applied to every metric emitted for this tenant.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Prefix of every metric name, either empty or ending with a period.
    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_tag_added() {
        let tenant = TenantContext::new("myapp", ["env:prod"], "");
        assert_eq!(tenant.tags().to_string(), "app:myapp,env:prod");
        assert_eq!(tenant.metric_prefix(), "");
    }

    #[test]
    fn test_prefix_terminated() {
        let tenant = TenantContext::new("myapp", Vec::<String>::new(), "acme");
        assert_eq!(tenant.metric_prefix(), "acme.");

        let tenant = TenantContext::new("myapp", Vec::<String>::new(), "acme.");
        assert_eq!(tenant.metric_prefix(), "acme.");
    }
}
