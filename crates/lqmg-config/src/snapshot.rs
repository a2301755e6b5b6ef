//! Snapshots of merged configuration state.
//!
//! A snapshot captures every processed document and every indexed entry of a
//! container so that a generation run can be audited and compared with a
//! later one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::container::{ConfigurationContainer, ContainerStats, Scope};
use crate::document::Settings;
use crate::key::{BundleId, ConfigPath};
use crate::value::Provenance;

/// Kind of a snapshot entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Entity,
    NamingRule,
}

/// One indexed definition with its partition and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub scope: Scope,
    pub kind: EntryKind,

    /// Entity name or naming rule pattern.
    pub name: String,

    /// Effective settings after defaulting.
    #[serde(flatten)]
    pub settings: Settings,

    pub provenance: Provenance,
}

/// A frozen snapshot of a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the snapshot format.
    pub schema_version: String,

    /// Processed documents, sorted.
    pub documents: Vec<ConfigPath>,

    /// Indexed entries, sorted by scope, kind, schema and name.
    pub entries: Vec<SnapshotEntry>,

    /// SHA-256 over documents and entries (for quick comparison).
    pub combined_hash: String,

    /// Map sizes at capture time.
    pub stats: ContainerStats,
}

impl ConfigSnapshot {
    /// Capture the current state of `container`.
    pub fn capture(container: &ConfigurationContainer) -> Result<Self, serde_json::Error> {
        let documents: Vec<ConfigPath> = container
            .processed_documents()
            .into_iter()
            .cloned()
            .collect();

        let mut entries = Vec::new();
        for scope in [Scope::Main, Scope::Bundle] {
            entries.extend(container.entities(scope).map(|(_, value)| SnapshotEntry {
                scope,
                kind: EntryKind::Entity,
                name: value.definition().name.clone(),
                settings: value.definition().settings.clone(),
                provenance: value.provenance().clone(),
            }));
            entries.extend(container.naming_rules(scope).map(|(_, value)| SnapshotEntry {
                scope,
                kind: EntryKind::NamingRule,
                name: value.definition().regex.clone(),
                settings: value.definition().settings.clone(),
                provenance: value.provenance().clone(),
            }));
        }
        entries.sort_by(|a, b| {
            (a.scope, a.kind, a.settings.schema(), a.name.as_str())
                .cmp(&(b.scope, b.kind, b.settings.schema(), b.name.as_str()))
        });

        let combined_hash = combined_hash(&documents, &entries)?;

        Ok(ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            documents,
            entries,
            combined_hash,
            stats: container.stats(),
        })
    }

    /// Entries contributed by `bundle`.
    pub fn bundle_entries<'a>(
        &'a self,
        bundle: &'a BundleId,
    ) -> impl Iterator<Item = &'a SnapshotEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.provenance.bundle.as_ref() == Some(bundle))
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same merged state as another.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }

    /// Short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.combined_hash[..12.min(self.combined_hash.len())]
    }
}

fn combined_hash(
    documents: &[ConfigPath],
    entries: &[SnapshotEntry],
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    for document in documents {
        hasher.update(document.bundle_id().map(BundleId::as_str).unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(document.resource().as_bytes());
        hasher.update([0u8]);
    }
    for entry in entries {
        hasher.update(serde_json::to_vec(entry)?);
        hasher.update([b'\n']);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, EntityDefinition, NamingRuleDefinition};

    fn sample_container(order_swapped: bool) -> ConfigurationContainer {
        let main = Document::new()
            .with_default_package("com.acme")
            .with_entry(EntityDefinition::new("EMPLOYEE"))
            .with_entry(NamingRuleDefinition::new("AUDIT_.*"));
        let hr = Document::new()
            .with_default_schema("HR")
            .with_entry(EntityDefinition::new("EMPLOYEE").with_package("com.acme.hr"));

        let main_path = ConfigPath::main("lqmg.xml");
        let hr_path = ConfigPath::bundle("hr", "META-INF/lqmg.xml");

        let mut container = ConfigurationContainer::new();
        if order_swapped {
            container.add(&hr, &hr_path).unwrap();
            container.add(&main, &main_path).unwrap();
        } else {
            container.add(&main, &main_path).unwrap();
            container.add(&hr, &hr_path).unwrap();
        }
        container
    }

    #[test]
    fn test_capture_lists_everything() {
        let snapshot = ConfigSnapshot::capture(&sample_container(false)).unwrap();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(snapshot.documents.len(), 2);
        assert_eq!(snapshot.entries.len(), 3);
        assert_eq!(snapshot.stats.bundle_entities, 1);

        let first = &snapshot.entries[0];
        assert_eq!(first.scope, Scope::Main);
        assert_eq!(first.kind, EntryKind::Entity);
        assert_eq!(first.settings.package(), Some("com.acme"));

        let hr = BundleId::new("hr");
        let bundle_entries: Vec<&SnapshotEntry> = snapshot.bundle_entries(&hr).collect();
        assert_eq!(bundle_entries.len(), 1);
        assert_eq!(bundle_entries[0].settings.schema(), Some("HR"));
    }

    #[test]
    fn test_snapshot_hash_ignores_ingestion_order() {
        let a = ConfigSnapshot::capture(&sample_container(false)).unwrap();
        let b = ConfigSnapshot::capture(&sample_container(true)).unwrap();
        assert!(a.matches(&b));
        assert_eq!(a.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_hash_changes_with_content() {
        let a = ConfigSnapshot::capture(&sample_container(false)).unwrap();
        let b = ConfigSnapshot::capture(&ConfigurationContainer::new()).unwrap();
        assert!(!a.matches(&b));
        assert_eq!(b.combined_hash.len(), 64);
    }

    #[test]
    fn test_snapshot_hash_covers_entry_settings() {
        let capture_with = |package: &str| {
            let mut container = ConfigurationContainer::new();
            let document = Document::new()
                .with_entry(EntityDefinition::new("EMPLOYEE").with_package(package));
            container.add(&document, &ConfigPath::main("lqmg.xml")).unwrap();
            ConfigSnapshot::capture(&container).unwrap()
        };

        // Same documents, different settings.
        let a = capture_with("com.acme");
        let b = capture_with("com.acme.hr");
        assert_eq!(a.documents, b.documents);
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::capture(&sample_container(false)).unwrap();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
        assert_eq!(restored.entries, snapshot.entries);
    }
}
