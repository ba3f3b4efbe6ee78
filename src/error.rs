//! Error taxonomy shared by the library and the CLI.
//!
//! Every failure surfaces as a [`LookupError`]. A query that matches nothing
//! is not an error: lookups return `Option` for that case.

use thiserror::Error;

/// Errors that abort a lookup invocation.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Invalid combination of command-line inputs.
    #[error("{0}")]
    Usage(String),

    /// No bibliography source could be resolved.
    #[error("{0}")]
    Configuration(String),

    /// The bibliography file does not exist.
    #[error("bibliography file not found: {path}")]
    NotFound { path: String },

    /// The bibliography file is unreadable or has the wrong shape.
    #[error("{0}")]
    Parse(String),

    /// The DEVONthink bridge failed, timed out, or answered with garbage.
    #[error("{0}")]
    ExternalTool(String),
}

impl LookupError {
    /// Stable tag written into error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Usage(_) => "UsageError",
            LookupError::Configuration(_) => "ConfigurationError",
            LookupError::NotFound { .. } => "NotFoundError",
            LookupError::Parse(_) => "ParseError",
            LookupError::ExternalTool(_) => "ExternalToolError",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Same code clap uses for its own argument errors
            LookupError::Usage(_) => 2,
            LookupError::Configuration(_) => 10,
            LookupError::NotFound { .. } => 11,
            LookupError::Parse(_) => 12,
            LookupError::ExternalTool(_) => 13,
        }
    }
}
