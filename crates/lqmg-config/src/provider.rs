//! Sources of configuration document bytes.
//!
//! The container never reads resources on its own; it asks a
//! [`DocumentProvider`] for the bytes behind a [`ConfigPath`]. The filesystem
//! provider treats every bundle as a directory root, which is how bundles
//! look on disk before they are packaged.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::key::{BundleId, ConfigPath};
use crate::xml::parse_document;

/// Resource path of a bundle's configuration document when none is given.
pub const DEFAULT_RESOURCE: &str = "META-INF/lqmg.xml";

/// Capability to read the raw bytes of a configuration document.
pub trait DocumentProvider {
    /// Fetch the document at `path`, failing with
    /// [`ConfigError::DocumentNotFound`] when it does not exist.
    fn fetch(&self, path: &ConfigPath) -> Result<Vec<u8>>;
}

/// Fetch and parse the document at `path`.
pub fn load_document<P: DocumentProvider + ?Sized>(provider: &P, path: &ConfigPath) -> Result<Document> {
    let bytes = provider.fetch(path)?;
    debug!(path = %path, bytes = bytes.len(), "Fetched configuration document");
    parse_document(path.resource(), &bytes)
}

/// Reads documents from directories: one root for the main document, one
/// root per registered bundle.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentProvider {
    main_root: Option<PathBuf>,
    bundle_roots: HashMap<BundleId, PathBuf>,
}

impl FsDocumentProvider {
    pub fn new() -> Self {
        FsDocumentProvider::default()
    }

    /// Directory that main-document resources are resolved against.
    pub fn with_main_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.main_root = Some(root.into());
        self
    }

    /// Register the directory holding `bundle`'s resources.
    pub fn with_bundle(mut self, bundle: impl Into<BundleId>, root: impl Into<PathBuf>) -> Self {
        self.bundle_roots.insert(bundle.into(), root.into());
        self
    }

    /// Registered bundles, sorted by id.
    pub fn bundles(&self) -> Vec<&BundleId> {
        let mut bundles: Vec<&BundleId> = self.bundle_roots.keys().collect();
        bundles.sort();
        bundles
    }

    /// Filesystem location of `path`, if its root is known.
    pub fn locate(&self, path: &ConfigPath) -> Option<PathBuf> {
        let root = match path.bundle_id() {
            Some(bundle) => self.bundle_roots.get(bundle)?,
            None => self.main_root.as_ref()?,
        };
        // Resource paths are relative to the root, as on a classpath.
        Some(root.join(path.resource().trim_start_matches('/')))
    }
}

impl DocumentProvider for FsDocumentProvider {
    fn fetch(&self, path: &ConfigPath) -> Result<Vec<u8>> {
        let not_found = || ConfigError::DocumentNotFound { path: path.clone() };

        let file = self.locate(path).ok_or_else(not_found)?;
        if !file.is_file() {
            return Err(not_found());
        }
        fs::read(&file).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(),
            _ => ConfigError::Io(e),
        })
    }
}

/// Keeps documents in memory; useful for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentProvider {
    documents: HashMap<ConfigPath, Vec<u8>>,
}

impl MemoryDocumentProvider {
    pub fn new() -> Self {
        MemoryDocumentProvider::default()
    }

    pub fn insert(&mut self, path: ConfigPath, bytes: impl Into<Vec<u8>>) {
        self.documents.insert(path, bytes.into());
    }

    pub fn with_document(mut self, path: ConfigPath, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl DocumentProvider for MemoryDocumentProvider {
    fn fetch(&self, path: &ConfigPath) -> Result<Vec<u8>> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| ConfigError::DocumentNotFound { path: path.clone() })
    }
}
