//! The configuration merge store.
//!
//! Documents contributed by the main configuration and by bundles are
//! flattened into four partitions:
//!
//! | entry kind  | main document      | bundle document      |
//! |-------------|--------------------|----------------------|
//! | entity      | `main_entities`    | `bundle_entities`    |
//! | naming rule | `main_naming_rules`| `bundle_naming_rules`|
//!
//! A key may appear at most once per partition. Ordinary resolution only
//! reads the main partitions; bundle partitions are reachable through the
//! explicit `bundle_*` queries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

use crate::document::{Document, EntityDefinition, Entry, NamingRuleDefinition, Settings};
use crate::error::{ConfigError, Result};
use crate::key::{BundleId, ConfigKey, ConfigPath};
use crate::pattern::PatternCache;
use crate::provider::{load_document, DocumentProvider};
use crate::value::{Cached, ConfigValue, Provenance};

type Partition<T> = IndexMap<ConfigKey, ConfigValue<T>>;

/// Which document family a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Entries from the main (global) document.
    Main,
    /// Entries from bundle documents.
    Bundle,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Main => write!(f, "main"),
            Scope::Bundle => write!(f, "bundle"),
        }
    }
}

/// Kind of entry that produced a [`GenerationTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// An entity definition for the table.
    Entity,
    /// A naming rule whose pattern matches the table name.
    NamingRule,
}

/// Effective code generation settings for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTarget {
    /// The table the target was resolved for.
    pub entity: String,

    /// Package of the generated classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Schema to keep in the generated metadata; `None` when the matching
    /// entry disables `useSchema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub source: TargetSource,

    /// Document the matching entry came from.
    pub provenance: Provenance,
}

impl GenerationTarget {
    fn new(
        entity: &str,
        requested_schema: Option<&str>,
        settings: &Settings,
        source: TargetSource,
        provenance: &Provenance,
    ) -> Self {
        let schema = if settings.use_schema() {
            settings.schema().or(requested_schema).map(str::to_string)
        } else {
            None
        };
        GenerationTarget {
            entity: entity.to_string(),
            package: settings.package.clone(),
            schema,
            source,
            provenance: provenance.clone(),
        }
    }
}

/// Sizes of the container's maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub documents: usize,
    pub main_entities: usize,
    pub bundle_entities: usize,
    pub main_naming_rules: usize,
    pub bundle_naming_rules: usize,
    pub cached_resolutions: usize,
    pub compiled_patterns: usize,
}

impl fmt::Display for ContainerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "documents:           {}", self.documents)?;
        writeln!(f, "main entities:       {}", self.main_entities)?;
        writeln!(f, "bundle entities:     {}", self.bundle_entities)?;
        writeln!(f, "main naming rules:   {}", self.main_naming_rules)?;
        write!(f, "bundle naming rules: {}", self.bundle_naming_rules)
    }
}

/// Merge store for the configuration documents of one generation run.
#[derive(Debug, Default)]
pub struct ConfigurationContainer {
    processed: HashSet<ConfigPath>,
    main_entities: Partition<EntityDefinition>,
    bundle_entities: Partition<EntityDefinition>,
    main_naming_rules: Partition<NamingRuleDefinition>,
    bundle_naming_rules: Partition<NamingRuleDefinition>,
    cache: HashMap<ConfigKey, Cached>,
    rule_matches: HashMap<ConfigKey, Option<ConfigValue<NamingRuleDefinition>>>,
    patterns: PatternCache,
}

impl ConfigurationContainer {
    pub fn new() -> Self {
        ConfigurationContainer::default()
    }

    /// Ingest `document`, identified by `path`.
    ///
    /// Returns `Ok(false)` without touching any map when `path` has been
    /// ingested before, whatever the document content is now. Entries inherit
    /// unset settings from the document defaults before they are indexed.
    pub fn add(&mut self, document: &Document, path: &ConfigPath) -> Result<bool> {
        if !self.processed.insert(path.clone()) {
            debug!(path = %path, "Configuration document already processed");
            return Ok(false);
        }

        for entry in &document.entries {
            match entry {
                Entry::Entity(entity) => {
                    let mut entity = entity.clone();
                    entity.settings.inherit(&document.defaults);
                    let key = entity.key();
                    let partition = if path.is_main() {
                        &mut self.main_entities
                    } else {
                        &mut self.bundle_entities
                    };
                    purge_cached(&mut self.cache, &key);
                    insert_unique(partition, key, ConfigValue::new(entity, path))?;
                }
                Entry::NamingRule(rule) => {
                    let mut rule = rule.clone();
                    rule.settings.inherit(&document.defaults);
                    self.patterns.compile(&rule.regex)?;
                    let key = rule.key();
                    let partition = if path.is_main() {
                        // Any entity name may now match a different rule.
                        self.rule_matches.clear();
                        &mut self.main_naming_rules
                    } else {
                        &mut self.bundle_naming_rules
                    };
                    purge_cached(&mut self.cache, &key);
                    insert_unique(partition, key, ConfigValue::new(rule, path))?;
                }
            }
        }

        info!(
            resource = path.resource(),
            bundle = ?path.bundle_id().map(BundleId::as_str),
            entries = document.entries.len(),
            "Configuration document ingested"
        );
        Ok(true)
    }

    /// Fetch the document at `path` from `provider`, parse it and ingest it.
    ///
    /// Already processed paths are skipped before anything is fetched.
    pub fn add_from_provider<P: DocumentProvider + ?Sized>(
        &mut self,
        provider: &P,
        path: &ConfigPath,
    ) -> Result<bool> {
        if self.is_processed(path) {
            debug!(path = %path, "Configuration document already processed");
            return Ok(false);
        }
        let document = load_document(provider, path)?;
        self.add(&document, path)
    }

    /// Resolve the entity definition for `key` from the main document.
    ///
    /// A schema-qualified key that is not defined falls back to the unscoped
    /// key with the same name. Both hits and misses are cached; a cached
    /// answer is returned as is until a later `add` redefines the key.
    pub fn resolve(&mut self, key: &ConfigKey) -> Option<ConfigValue<EntityDefinition>> {
        if let Some(cached) = self.cache.get(key) {
            return cached.to_lookup();
        }

        let found = lookup_with_fallback(&self.main_entities, key).cloned();
        self.cache
            .insert(key.clone(), Cached::from_lookup(found.clone()));
        found
    }

    /// Find the main naming rule whose pattern matches `key.name()`.
    ///
    /// Rules declared for `key.schema()` are tried first, then unscoped
    /// rules. Within a scope the first rule in ingestion order wins.
    pub fn resolve_naming_rule(
        &mut self,
        key: &ConfigKey,
    ) -> Option<ConfigValue<NamingRuleDefinition>> {
        if let Some(cached) = self.rule_matches.get(key) {
            return cached.clone();
        }

        let mut found = self.first_matching_rule(key.schema(), key.name());
        if found.is_none() && key.is_scoped() {
            found = self.first_matching_rule(None, key.name());
        }
        self.rule_matches.insert(key.clone(), found.clone());
        found
    }

    /// Effective generation settings for table `entity` in `schema`.
    ///
    /// An entity definition takes precedence over naming rules.
    pub fn resolve_target(&mut self, schema: Option<&str>, entity: &str) -> Option<GenerationTarget> {
        let key = ConfigKey::new(schema.map(str::to_string), entity);

        if let Some(value) = self.resolve(&key) {
            return Some(GenerationTarget::new(
                entity,
                schema,
                &value.definition().settings,
                TargetSource::Entity,
                value.provenance(),
            ));
        }

        let rule = self.resolve_naming_rule(&key)?;
        Some(GenerationTarget::new(
            entity,
            schema,
            &rule.definition().settings,
            TargetSource::NamingRule,
            rule.provenance(),
        ))
    }

    /// Entity definition contributed by `bundle` for `key`, with the same
    /// unscoped fallback as [`resolve`](Self::resolve).
    pub fn bundle_entity(
        &self,
        bundle: &BundleId,
        key: &ConfigKey,
    ) -> Option<&ConfigValue<EntityDefinition>> {
        let owned_by = |value: &&ConfigValue<EntityDefinition>| value.bundle() == Some(bundle);
        self.bundle_entities
            .get(key)
            .filter(owned_by)
            .or_else(|| {
                key.is_scoped()
                    .then(|| self.bundle_entities.get(&key.without_schema()))
                    .flatten()
                    .filter(owned_by)
            })
    }

    /// Naming rule contributed by `bundle` under exactly `key`.
    pub fn bundle_naming_rule(
        &self,
        bundle: &BundleId,
        key: &ConfigKey,
    ) -> Option<&ConfigValue<NamingRuleDefinition>> {
        self.bundle_naming_rules
            .get(key)
            .filter(|value| value.bundle() == Some(bundle))
    }

    /// All entity definitions contributed by `bundle`, in ingestion order.
    pub fn bundle_entities<'a>(
        &'a self,
        bundle: &'a BundleId,
    ) -> impl Iterator<Item = &'a ConfigValue<EntityDefinition>> + 'a {
        self.bundle_entities
            .values()
            .filter(move |value| value.bundle() == Some(bundle))
    }

    /// Entity partition for `scope`, in ingestion order.
    pub fn entities(
        &self,
        scope: Scope,
    ) -> impl Iterator<Item = (&ConfigKey, &ConfigValue<EntityDefinition>)> {
        match scope {
            Scope::Main => self.main_entities.iter(),
            Scope::Bundle => self.bundle_entities.iter(),
        }
    }

    /// Naming rule partition for `scope`, in ingestion order.
    pub fn naming_rules(
        &self,
        scope: Scope,
    ) -> impl Iterator<Item = (&ConfigKey, &ConfigValue<NamingRuleDefinition>)> {
        match scope {
            Scope::Main => self.main_naming_rules.iter(),
            Scope::Bundle => self.bundle_naming_rules.iter(),
        }
    }

    pub fn is_processed(&self, path: &ConfigPath) -> bool {
        self.processed.contains(path)
    }

    /// Processed document paths, sorted.
    pub fn processed_documents(&self) -> Vec<&ConfigPath> {
        let mut paths: Vec<&ConfigPath> = self.processed.iter().collect();
        paths.sort();
        paths
    }

    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            documents: self.processed.len(),
            main_entities: self.main_entities.len(),
            bundle_entities: self.bundle_entities.len(),
            main_naming_rules: self.main_naming_rules.len(),
            bundle_naming_rules: self.bundle_naming_rules.len(),
            cached_resolutions: self.cache.len(),
            compiled_patterns: self.patterns.compilations(),
        }
    }

    fn first_matching_rule(
        &self,
        schema: Option<&str>,
        entity: &str,
    ) -> Option<ConfigValue<NamingRuleDefinition>> {
        let mut matching = self
            .main_naming_rules
            .iter()
            .filter(|(key, _)| key.schema() == schema)
            .filter(|(key, _)| {
                self.patterns
                    .get(key.name())
                    .is_some_and(|regex| regex.is_match(entity))
            })
            .map(|(_, value)| value);

        let first = matching.next()?;
        let others = matching.count();
        if others > 0 {
            warn!(
                entity,
                schema = ?schema,
                rule = %first.definition().regex,
                others,
                "Several naming rules match; using the first declared"
            );
        }
        Some(first.clone())
    }
}

/// Drop cached resolutions that a new definition for `key` may change.
///
/// An unscoped definition is also the fallback for every scoped key with
/// the same name, so those entries go as well.
fn purge_cached(cache: &mut HashMap<ConfigKey, Cached>, key: &ConfigKey) {
    if key.is_scoped() {
        if cache.remove(key).is_some() {
            debug!(key = %key, "Purged cached resolution");
        }
    } else {
        let before = cache.len();
        cache.retain(|cached, _| cached.name() != key.name());
        if cache.len() != before {
            debug!(key = %key, purged = before - cache.len(), "Purged cached resolutions");
        }
    }
}

fn insert_unique<T>(
    partition: &mut Partition<T>,
    key: ConfigKey,
    value: ConfigValue<T>,
) -> Result<()> {
    if let Some(existing) = partition.get(&key) {
        return Err(ConfigError::DuplicateConfiguration {
            key,
            existing: existing.provenance().clone(),
            duplicate: value.provenance().clone(),
        });
    }
    partition.insert(key, value);
    Ok(())
}

fn lookup_with_fallback<'a, T>(
    partition: &'a Partition<T>,
    key: &ConfigKey,
) -> Option<&'a ConfigValue<T>> {
    match partition.get(key) {
        Some(value) => Some(value),
        None if key.is_scoped() => partition.get(&key.without_schema()),
        None => None,
    }
}
