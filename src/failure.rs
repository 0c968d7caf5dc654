//! Structured failure values.
//!
//! External operations report recoverable failures as ordinary `Failure`
//! values, never as panics. The only place a panic is turned into a value
//! is the store's call boundary, which routes through [`Failure::from_panic`].

use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Server,
    Network,
    Cache,
    Validation,
    Authentication,
    Authorization,
    Timeout,
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Server => "server",
            FailureKind::Network => "network",
            FailureKind::Cache => "cache",
            FailureKind::Validation => "validation",
            FailureKind::Authentication => "authentication",
            FailureKind::Authorization => "authorization",
            FailureKind::Timeout => "timeout",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Immutable, structured error value attached to page or slot state.
///
/// Equality and hashing consider only `(kind, message, code)`; the opaque
/// cause and field errors are carried for diagnostics but do not affect
/// identity.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub code: Option<i32>,
    /// Per-field validation messages; only meaningful for `Validation`.
    pub field_errors: Option<BTreeMap<String, String>>,
    /// Underlying cause, if any. Not serialized, not part of equality.
    #[serde(skip)]
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message && self.code == other.code
    }
}

impl Eq for Failure {}

impl Hash for Failure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.message.hash(state);
        self.code.hash(state);
    }
}

impl Failure {
    /// Create a failure of an arbitrary kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            field_errors: None,
            cause: None,
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Server, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cache, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Authorization, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    /// Attach a numeric code (e.g. an HTTP status).
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach an underlying cause.
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach per-field validation messages.
    pub fn with_field_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.field_errors = Some(errors);
        self
    }

    /// The underlying cause, if one was attached.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Normalize a caught panic payload into an `Unknown` failure.
    ///
    /// `&str` and `String` payloads keep their text; anything else becomes
    /// an opaque description.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unexpected panic in external operation".to_string()
        };
        Self::unknown(message)
    }
}
