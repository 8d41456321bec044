//! Error types for the validation engine
//!
//! A failed rule is not an `Err`: it is an [`ErrorKind`] value handed to the
//! `on_invalid_field` hook. Only misuse of the engine itself ([`EngineError`])
//! and failures of the remote transport ([`RemoteError`]) are errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for engine construction and entry points
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Why a field was judged invalid.
///
/// Exactly one kind accompanies every invalid [`ValidationResult`](crate::ValidationResult).
/// The wire names match what a remote endpoint may return.
///
/// # Examples
///
/// ```rust,ignore
/// use formcheck::ErrorKind;
///
/// assert_eq!(ErrorKind::MaxLength.code(), "maxlength");
/// assert_eq!(ErrorKind::RemoteRejected("taken".into()).to_string(), "remote-rejected: taken");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Empty value on a field marked required.
    Required,
    /// Value does not satisfy the declared pattern.
    Pattern,
    /// Value is longer than the declared bound.
    #[serde(rename = "maxlength")]
    MaxLength,
    /// Value is not acceptable for the control kind (number, email, date).
    Type,
    /// Value differs from the declared match target.
    Match,
    /// Value is below the declared minimum.
    Min,
    /// Value is above the declared maximum.
    Max,
    /// Value is not a multiple of the declared step.
    Step,
    /// The remote endpoint rejected the value; carries the server's answer.
    RemoteRejected(String),
    /// A caller-supplied check rejected the value; carries its label.
    Custom(String),
    /// The remote check could not be completed.
    TransportFailure,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Pattern => "pattern",
            Self::MaxLength => "maxlength",
            Self::Type => "type",
            Self::Match => "match",
            Self::Min => "min",
            Self::Max => "max",
            Self::Step => "step",
            Self::RemoteRejected(_) => "remote-rejected",
            Self::Custom(_) => "custom",
            Self::TransportFailure => "transport-failure",
        }
    }

    /// Payload supplied by the server or the custom check, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::RemoteRejected(detail) | Self::Custom(detail) => Some(detail),
            _ => None,
        }
    }

    /// Creates a custom kind with the given label.
    pub fn custom(label: impl Into<String>) -> Self {
        Self::Custom(label.into())
    }

    /// Interprets a non-`true` value from a remote response.
    ///
    /// Strings are taken verbatim; anything else keeps its JSON text.
    #[must_use]
    pub fn from_remote(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::RemoteRejected(s.clone()),
            other => Self::RemoteRejected(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) if !detail.is_empty() => write!(f, "{}: {detail}", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

// ============================================================================
// ENGINE ERROR
// ============================================================================

/// Misuse of the engine: bad construction input or a dangling field id.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The form definition has no fields to validate.
    #[error("Form '{form}' has no fields")]
    EmptyForm {
        /// The form name
        form: String,
    },

    /// A field id does not address any field of the form.
    #[error("Unknown field id {id}")]
    UnknownField {
        /// The rejected id
        id: usize,
    },

    /// A named pattern failed to compile.
    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        /// The pattern name
        name: String,
        /// The compile error
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

// ============================================================================
// REMOTE ERROR
// ============================================================================

/// A remote check that produced no usable answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The endpoint answered with a non-success status.
    #[error("Remote endpoint answered with status {status}")]
    Status {
        /// The HTTP status code
        status: u16,
    },

    /// The body was not valid JSON.
    #[error("Remote response is not valid JSON: {0}")]
    Parse(String),

    /// The body was JSON but not an object.
    #[error("Remote response is not a JSON object")]
    NotAnObject,

    /// No answer within the configured timeout.
    #[error("Remote check timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout in milliseconds
        timeout_ms: u64,
    },

    /// The transport itself failed (connection, I/O).
    #[error("Transport failed: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
