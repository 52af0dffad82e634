use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Contract errors raised by envelope operations. These indicate a caller bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// `filter_by_year` was called without a usable year string.
    #[error("invalid year: {value:?}")]
    InvalidYear { value: String },
}

/// Data-shape failures found while parsing a raw search payload.
///
/// These never escape `ResultEnvelope::parse` as an `Err`; they are carried inside
/// the error variant of the returned `Response` so callers branch on `is_error()`.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The `results` section is not a non-empty keyed structure, or one of its buckets is malformed.
    #[error("invalid results format")]
    InvalidResults { details: Option<ValidationError> },

    /// The `count` section is empty, not iterable, or carries malformed rows.
    #[error("invalid count format")]
    InvalidCount { details: Option<ValidationError> },
}

impl ParseError {
    /// Field level diagnosis, when the failure came from decoding individual entries.
    pub fn details(&self) -> Option<&ValidationError> {
        match self {
            ParseError::InvalidResults { details } | ParseError::InvalidCount { details } => details.as_ref(),
        }
    }
}

/// Failures while loading `historia.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Collection of validation issues encountered while decoding a value.
#[derive(Debug, Clone, Error, Serialize)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue was recorded against exactly `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

/// Detailed validation failure for a single field or logical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result alias for the schema decoders.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collects issues while walking a value, then converts into a `ValidationResult`.
#[derive(Debug, Default)]
pub(crate) struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub(crate) fn push(&mut self, field: impl Into<String>, code: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, code, message));
    }

    pub(crate) fn extend(&mut self, error: ValidationError) {
        self.issues.extend(error.issues);
    }

    pub(crate) fn finish<T>(self, value: T) -> ValidationResult<T> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError::new(self.issues))
        }
    }
}
