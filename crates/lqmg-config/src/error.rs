//! Error types for configuration loading and merging.

use thiserror::Error;

use crate::key::{ConfigKey, ConfigPath};
use crate::value::Provenance;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or merging configuration documents.
///
/// Every variant is fatal for a generation run: a misconfigured entity that
/// was silently dropped would produce wrong generated code.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The provider has no document at the requested path.
    #[error("configuration document not found: {path}")]
    DocumentNotFound { path: ConfigPath },

    /// The document bytes are not a valid configuration document.
    #[error("malformed configuration document '{resource}': {reason}")]
    MalformedDocument { resource: String, reason: String },

    /// Two documents define the same key in the same partition.
    #[error("configuration is defined more than once: {key}\n  {duplicate}\n  {existing}")]
    DuplicateConfiguration {
        key: ConfigKey,
        existing: Provenance,
        duplicate: Provenance,
    },

    /// A naming rule carries a regular expression that does not compile.
    #[error("invalid naming rule pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Stable error code for structured reporting.
    ///
    /// - 10-19: configuration errors
    /// - 60-69: I/O and serialization errors
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::DocumentNotFound { .. } => 10,
            ConfigError::MalformedDocument { .. } => 11,
            ConfigError::DuplicateConfiguration { .. } => 12,
            ConfigError::MalformedPattern { .. } => 13,
            ConfigError::Io(_) => 60,
            ConfigError::Json(_) => 61,
        }
    }

    pub(crate) fn malformed(resource: &str, reason: impl Into<String>) -> Self {
        ConfigError::MalformedDocument {
            resource: resource.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::BundleId;

    #[test]
    fn test_duplicate_message_lists_both_definitions() {
        let err = ConfigError::DuplicateConfiguration {
            key: ConfigKey::scoped("s", "FOO"),
            existing: Provenance {
                bundle: None,
                resource: "main.xml".to_string(),
            },
            duplicate: Provenance {
                bundle: Some(BundleId::new("com.acme.hr")),
                resource: "META-INF/lqmg.xml".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("[schema: s, name: FOO]"));
        assert!(message.contains("Bundle: com.acme.hr; Path: META-INF/lqmg.xml"));
        assert!(message.contains("Path: main.xml"));
        assert_eq!(err.code(), 12);
    }

    #[test]
    fn test_error_codes() {
        let not_found = ConfigError::DocumentNotFound {
            path: ConfigPath::main("lqmg.xml"),
        };
        assert_eq!(not_found.code(), 10);
        assert!(not_found.to_string().contains("'lqmg.xml' (main)"));

        let malformed = ConfigError::malformed("lqmg.xml", "unexpected element");
        assert_eq!(malformed.code(), 11);

        let io = ConfigError::from(std::io::Error::other("disk gone"));
        assert_eq!(io.code(), 60);
    }
}
