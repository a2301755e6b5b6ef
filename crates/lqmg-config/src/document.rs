//! Typed model of an LQMG configuration document.
//!
//! A document declares defaults (package, schema, use-schema flag) and an
//! ordered list of entries. Each entry is either an entity definition keyed
//! by entity name, or a naming rule keyed by a regular expression that
//! applies to every matching entity name.

use serde::{Deserialize, Serialize};

use crate::key::ConfigKey;

/// Code generation settings shared by entities, naming rules and document defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Target package of the generated classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Database schema the entity lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Whether generated metadata keeps the schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_schema: Option<bool>,
}

impl Settings {
    /// Fill every unset field from `defaults`.
    pub fn inherit(&mut self, defaults: &Settings) {
        if self.package.is_none() {
            self.package = defaults.package.clone();
        }
        if self.schema.is_none() {
            self.schema = defaults.schema.clone();
        }
        if self.use_schema.is_none() {
            self.use_schema = defaults.use_schema;
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Unset means false.
    pub fn use_schema(&self) -> bool {
        self.use_schema.unwrap_or(false)
    }
}

/// Settings for one named entity (table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(flatten)]
    pub settings: Settings,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDefinition {
            name: name.into(),
            settings: Settings::default(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.settings.package = Some(package.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.settings.schema = Some(schema.into());
        self
    }

    pub fn with_use_schema(mut self, use_schema: bool) -> Self {
        self.settings.use_schema = Some(use_schema);
        self
    }

    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(self.settings.schema.clone(), self.name.clone())
    }
}

/// Settings applied to every entity whose name matches `regex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRuleDefinition {
    pub regex: String,
    #[serde(flatten)]
    pub settings: Settings,
}

impl NamingRuleDefinition {
    pub fn new(regex: impl Into<String>) -> Self {
        NamingRuleDefinition {
            regex: regex.into(),
            settings: Settings::default(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.settings.package = Some(package.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.settings.schema = Some(schema.into());
        self
    }

    pub fn with_use_schema(mut self, use_schema: bool) -> Self {
        self.settings.use_schema = Some(use_schema);
        self
    }

    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(self.settings.schema.clone(), self.regex.clone())
    }
}

/// One entry of a document's `entities` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Entity(EntityDefinition),
    NamingRule(NamingRuleDefinition),
}

impl Entry {
    pub fn key(&self) -> ConfigKey {
        match self {
            Entry::Entity(entity) => entity.key(),
            Entry::NamingRule(rule) => rule.key(),
        }
    }

    pub fn settings(&self) -> &Settings {
        match self {
            Entry::Entity(entity) => &entity.settings,
            Entry::NamingRule(rule) => &rule.settings,
        }
    }
}

impl From<EntityDefinition> for Entry {
    fn from(entity: EntityDefinition) -> Self {
        Entry::Entity(entity)
    }
}

impl From<NamingRuleDefinition> for Entry {
    fn from(rule: NamingRuleDefinition) -> Self {
        Entry::NamingRule(rule)
    }
}

/// A deserialized configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document-level defaults inherited by entries at ingestion time.
    #[serde(default)]
    pub defaults: Settings,

    /// Entries in document order.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    pub fn with_default_package(mut self, package: impl Into<String>) -> Self {
        self.defaults.package = Some(package.into());
        self
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.defaults.schema = Some(schema.into());
        self
    }

    pub fn with_default_use_schema(mut self, use_schema: bool) -> Self {
        self.defaults.use_schema = Some(use_schema);
        self
    }

    pub fn with_entry(mut self, entry: impl Into<Entry>) -> Self {
        self.entries.push(entry.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_fills_only_unset_fields() {
        let defaults = Settings {
            package: Some("p".to_string()),
            schema: Some("s".to_string()),
            use_schema: Some(true),
        };

        let mut settings = Settings {
            package: Some("own".to_string()),
            schema: None,
            use_schema: Some(false),
        };
        settings.inherit(&defaults);

        assert_eq!(settings.package(), Some("own"));
        assert_eq!(settings.schema(), Some("s"));
        assert!(!settings.use_schema());
    }

    #[test]
    fn test_inherit_from_empty_defaults_keeps_unset() {
        let mut settings = Settings::default();
        settings.inherit(&Settings::default());
        assert_eq!(settings, Settings::default());
        assert!(!settings.use_schema());
    }

    #[test]
    fn test_entry_keys() {
        let entity: Entry = EntityDefinition::new("EMPLOYEE").with_schema("HR").into();
        assert_eq!(entity.key(), ConfigKey::scoped("HR", "EMPLOYEE"));

        let rule: Entry = NamingRuleDefinition::new("EMP_.*").into();
        assert_eq!(rule.key(), ConfigKey::unscoped("EMP_.*"));
    }

    #[test]
    fn test_document_builder_preserves_order() {
        let document = Document::new()
            .with_default_package("com.acme")
            .with_entry(EntityDefinition::new("B"))
            .with_entry(NamingRuleDefinition::new("X.*"))
            .with_entry(EntityDefinition::new("A"));

        assert_eq!(document.defaults.package(), Some("com.acme"));
        let names: Vec<String> = document
            .entries
            .iter()
            .map(|e| e.key().name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "X.*", "A"]);
    }
}
