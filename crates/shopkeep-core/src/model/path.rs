// ── Collection paths ──

use std::fmt;

use crate::error::CoreError;

/// A slash-separated document collection path, e.g. `companies/acme/products`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// The product collection for a tenant: `companies/<tenant>/products`.
    pub fn products(tenant: &str) -> Result<Self, CoreError> {
        let tenant = tenant.trim();
        if tenant.is_empty() || tenant.contains('/') {
            return Err(CoreError::Config {
                message: format!("invalid tenant id: {tenant:?}"),
            });
        }
        Ok(Self(format!("companies/{tenant}/products")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
