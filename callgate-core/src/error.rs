//! Error types for callgate
//!
//! Evaluation itself never fails: `check` is total and the canonical
//! serializer degrades instead of erroring. Errors only arise while
//! *building* policy: compiling a rule pattern, loading settings, or
//! parsing a decision name.

use thiserror::Error;

/// Errors raised while constructing rules or loading policy settings.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A rule's argument pattern is not a valid regular expression
    #[error("invalid argument pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern text as supplied
        pattern: String,
        /// Underlying compilation error
        #[source]
        source: regex::Error,
    },

    /// Unknown decision name (expected allow, deny or ask_user)
    #[error("invalid decision '{0}': expected allow, deny or ask_user")]
    InvalidDecision(String),

    /// IO error while reading settings
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings document is not valid JSON or has the wrong shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolicyError {
    /// Returns true if a rule pattern failed to compile
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }

    /// Returns true if a decision name could not be parsed
    pub fn is_invalid_decision(&self) -> bool {
        matches!(self, Self::InvalidDecision(_))
    }

    /// Returns true if the settings could not be read or parsed
    pub fn is_settings(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Json(_))
    }
}

/// Result type alias for callgate operations
pub type Result<T> = std::result::Result<T, PolicyError>;
