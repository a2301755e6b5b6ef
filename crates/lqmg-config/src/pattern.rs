//! Memoized compilation of naming rule patterns.

use regex::Regex;
use regex_syntax::hir::{Hir, Look};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Compiles each distinct pattern text once and hands out shared handles.
///
/// Patterns match the whole entity name, not a substring of it.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: HashMap<String, Arc<Regex>>,
    compilations: usize,
}

impl PatternCache {
    pub fn new() -> Self {
        PatternCache::default()
    }

    /// Return the compiled form of `pattern`, compiling it on first use.
    pub fn compile(&mut self, pattern: &str) -> Result<Arc<Regex>> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Ok(Arc::clone(regex));
        }

        let regex = Regex::new(&anchored(pattern)?).map_err(|source| malformed(pattern, source))?;
        self.compilations += 1;
        debug!(pattern, "Compiled naming rule pattern");

        let regex = Arc::new(regex);
        self.patterns.insert(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    /// Look up an already compiled pattern.
    pub fn get(&self, pattern: &str) -> Option<&Arc<Regex>> {
        self.patterns.get(pattern)
    }

    /// Whether `value` matches `pattern` in full.
    pub fn matches(&mut self, pattern: &str, value: &str) -> Result<bool> {
        Ok(self.compile(pattern)?.is_match(value))
    }

    /// Number of patterns compiled so far.
    pub fn compilations(&self) -> usize {
        self.compilations
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Regex source that matches the whole of what `pattern` matches.
///
/// The anchors are added to the parsed expression rather than to the text,
/// so flags and comments inside `pattern` cannot reach them.
fn anchored(pattern: &str) -> Result<String> {
    let hir = regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|e| malformed(pattern, regex::Error::Syntax(e.to_string())))?;
    Ok(Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]).to_string())
}

fn malformed(pattern: &str, source: regex::Error) -> ConfigError {
    ConfigError::MalformedPattern {
        pattern: pattern.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_compiles_once() {
        let mut cache = PatternCache::new();
        let first = cache.compile("EMP_.*").unwrap();
        let second = cache.compile("EMP_.*").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compilations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_texts_compile_separately() {
        let mut cache = PatternCache::new();
        cache.compile("A.*").unwrap();
        cache.compile("B.*").unwrap();
        assert_eq!(cache.compilations(), 2);
    }

    #[test]
    fn test_matches_whole_name() {
        let mut cache = PatternCache::new();
        assert!(cache.matches("EMP.*", "EMPLOYEE").unwrap());
        assert!(!cache.matches("MP", "EMPLOYEE").unwrap());
        assert!(!cache.matches("EMP", "EMPLOYEE").unwrap());
        assert!(cache.matches("A|B", "B").unwrap());
        assert!(!cache.matches("A|B", "AB").unwrap());
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let mut cache = PatternCache::new();
        let err = cache.compile("EMP_(").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPattern { ref pattern, .. } if pattern == "EMP_("));
        assert!(cache.is_empty());
        assert_eq!(cache.compilations(), 0);
        assert!(cache.get("EMP_(").is_none());
    }

    #[test]
    fn test_unbalanced_close_is_rejected() {
        let mut cache = PatternCache::new();
        assert!(cache.compile("A)(B").is_err());
    }

    #[test]
    fn test_verbose_pattern_with_trailing_comment() {
        let mut cache = PatternCache::new();
        let regex = cache.compile("(?x)AUDIT_.* # audit tables").unwrap();
        assert!(regex.is_match("AUDIT_LOG"));
        assert!(!regex.is_match("X_AUDIT_LOG"));
        assert_eq!(cache.compilations(), 1);
    }

    #[test]
    fn test_inline_flags_stay_inside_the_pattern() {
        let mut cache = PatternCache::new();
        assert!(cache.matches("(?i)emp.*", "EMPLOYEE").unwrap());
        assert!(!cache.matches("(?i)emp", "EMPLOYEE").unwrap());
    }

    #[test]
    fn test_error_names_the_declared_pattern() {
        let mut cache = PatternCache::new();
        let message = cache.compile("EMP_(").unwrap_err().to_string();
        assert!(message.contains("'EMP_('"));
        assert!(!message.contains("^(?:"));
    }
}
