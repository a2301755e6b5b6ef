//! LQMG configuration merging.
//!
//! This crate provides:
//! - Typed model of configuration documents (entity definitions and naming rules)
//! - An XML reader for configuration documents
//! - Document providers (filesystem, in-memory)
//! - The merge store: duplicate detection, defaulting, cached resolution
//! - Snapshots of merged state for reproducibility
//!
//! # Example
//!
//! ```
//! use lqmg_config::{ConfigKey, ConfigPath, ConfigurationContainer, Document, EntityDefinition};
//!
//! let mut container = ConfigurationContainer::new();
//! let main = Document::new()
//!     .with_default_package("com.acme")
//!     .with_entry(EntityDefinition::new("EMPLOYEE"));
//! container.add(&main, &ConfigPath::main("lqmg.xml")).unwrap();
//!
//! let value = container.resolve(&ConfigKey::scoped("HR", "EMPLOYEE")).unwrap();
//! assert_eq!(value.definition().settings.package(), Some("com.acme"));
//! ```

pub mod container;
pub mod document;
pub mod error;
pub mod key;
pub mod pattern;
pub mod provider;
pub mod snapshot;
pub mod value;
pub mod xml;

pub use container::{ConfigurationContainer, ContainerStats, GenerationTarget, Scope, TargetSource};
pub use document::{Document, EntityDefinition, Entry, NamingRuleDefinition, Settings};
pub use error::{ConfigError, Result};
pub use key::{BundleId, ConfigKey, ConfigPath};
pub use pattern::PatternCache;
pub use provider::{
    load_document, DocumentProvider, FsDocumentProvider, MemoryDocumentProvider, DEFAULT_RESOURCE,
};
pub use snapshot::{ConfigSnapshot, EntryKind, SnapshotEntry};
pub use value::{ConfigValue, Provenance};
pub use xml::parse_document;

/// Schema version of snapshot output.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
