//! Identity types for bundles, configuration documents and lookup keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a bundle that contributes configuration documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    pub fn new(id: impl Into<String>) -> Self {
        BundleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BundleId {
    fn from(id: &str) -> Self {
        BundleId::new(id)
    }
}

impl From<String> for BundleId {
    fn from(id: String) -> Self {
        BundleId(id)
    }
}

/// Identity of one configuration document.
///
/// A document is the resource at `resource` inside the owning bundle, or
/// the main (global) document when there is no bundle. Two paths are equal
/// only when both parts are equal; the container uses this identity to
/// ingest each document at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigPath {
    bundle: Option<BundleId>,
    resource: String,
}

impl ConfigPath {
    /// Path of the main document, not owned by any bundle.
    pub fn main(resource: impl Into<String>) -> Self {
        ConfigPath {
            bundle: None,
            resource: resource.into(),
        }
    }

    /// Path of a document contributed by `bundle`.
    pub fn bundle(bundle: impl Into<BundleId>, resource: impl Into<String>) -> Self {
        ConfigPath {
            bundle: Some(bundle.into()),
            resource: resource.into(),
        }
    }

    pub fn bundle_id(&self) -> Option<&BundleId> {
        self.bundle.as_ref()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn is_main(&self) -> bool {
        self.bundle.is_none()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bundle {
            Some(bundle) => write!(f, "'{}' in bundle {}", self.resource, bundle),
            None => write!(f, "'{}' (main)", self.resource),
        }
    }
}

/// Composite lookup key: optional schema plus entity name or rule pattern.
///
/// For entity definitions `name` is the entity name; for naming rules it is
/// the regular expression text. A key without schema is unscoped and acts as
/// the fallback for every schema-qualified key with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigKey {
    schema: Option<String>,
    name: String,
}

impl ConfigKey {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        ConfigKey {
            schema,
            name: name.into(),
        }
    }

    pub fn scoped(schema: impl Into<String>, name: impl Into<String>) -> Self {
        ConfigKey::new(Some(schema.into()), name)
    }

    pub fn unscoped(name: impl Into<String>) -> Self {
        ConfigKey::new(None, name)
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_scoped(&self) -> bool {
        self.schema.is_some()
    }

    /// The same key with its schema dropped.
    pub fn without_schema(&self) -> ConfigKey {
        ConfigKey::unscoped(self.name.clone())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "[schema: {}, name: {}]", schema, self.name),
            None => write!(f, "[schema: <none>, name: {}]", self.name),
        }
    }
}
