//! Indexed configuration values and their provenance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::document::EntityDefinition;
use crate::key::{BundleId, ConfigPath};

/// Where a definition came from: owning bundle (if any) and resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleId>,
    pub resource: String,
}

impl From<&ConfigPath> for Provenance {
    fn from(path: &ConfigPath) -> Self {
        Provenance {
            bundle: path.bundle_id().cloned(),
            resource: path.resource().to_string(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(bundle) = &self.bundle {
            write!(f, "Bundle: {}; ", bundle)?;
        }
        write!(f, "Path: {}", self.resource)
    }
}

/// One ingested definition together with the document it came from.
///
/// The payload is shared, so clones handed out by lookups are cheap.
#[derive(Debug)]
pub struct ConfigValue<T> {
    definition: Arc<T>,
    provenance: Provenance,
}

impl<T> ConfigValue<T> {
    pub fn new(definition: T, path: &ConfigPath) -> Self {
        ConfigValue {
            definition: Arc::new(definition),
            provenance: Provenance::from(path),
        }
    }

    pub fn definition(&self) -> &T {
        &self.definition
    }

    pub fn bundle(&self) -> Option<&BundleId> {
        self.provenance.bundle.as_ref()
    }

    pub fn resource(&self) -> &str {
        &self.provenance.resource
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

impl<T> Clone for ConfigValue<T> {
    fn clone(&self) -> Self {
        ConfigValue {
            definition: Arc::clone(&self.definition),
            provenance: self.provenance.clone(),
        }
    }
}

/// A resolution-cache entry.
///
/// `Absent` records a lookup that found nothing, which is different from a
/// key that has never been looked up (no cache entry at all).
#[derive(Debug, Clone)]
pub(crate) enum Cached {
    Found(ConfigValue<EntityDefinition>),
    Absent,
}

impl Cached {
    pub(crate) fn from_lookup(value: Option<ConfigValue<EntityDefinition>>) -> Self {
        match value {
            Some(value) => Cached::Found(value),
            None => Cached::Absent,
        }
    }

    pub(crate) fn to_lookup(&self) -> Option<ConfigValue<EntityDefinition>> {
        match self {
            Cached::Found(value) => Some(value.clone()),
            Cached::Absent => None,
        }
    }
}
