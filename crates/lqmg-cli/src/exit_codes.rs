//! Exit codes for the `lqmg` CLI.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes
//! - 10-19: User/input errors (fixable by editing arguments or documents)
//! - 20-29: Internal errors

use lqmg_config::ConfigError;

/// Exit codes for lqmg operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// The requested entity has no configuration
    NotFound = 1,

    /// Invalid arguments
    ArgsError = 10,

    /// Configuration document missing or unreadable as XML
    DocumentError = 11,

    /// Conflicting or invalid definitions across documents
    DefinitionError = 12,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code is an error rather than an outcome.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::NotFound => "NOT_FOUND",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::DocumentError => "ERR_DOCUMENT",
            ExitCode::DefinitionError => "ERR_DEFINITION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::DocumentNotFound { .. } | ConfigError::MalformedDocument { .. } => {
                ExitCode::DocumentError
            }
            ConfigError::DuplicateConfiguration { .. } | ConfigError::MalformedPattern { .. } => {
                ExitCode::DefinitionError
            }
            ConfigError::Io(_) => ExitCode::IoError,
            ConfigError::Json(_) => ExitCode::InternalError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
