//! Host error objects.
//!
//! A [`HostError`] models an exception value thrown by the host runtime. It
//! has reference identity: clones point at the same error object, and
//! [`HostError::ptr_eq`] tells whether two values are the very same throw.
//! Bridges must hand the original object back to the caller rather than a
//! re-wrapped copy.

use std::fmt;
use std::sync::Arc;

/// The constructor family an error object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Error,
    TypeError,
    RangeError,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Error => "Error",
            ErrorClass::TypeError => "TypeError",
            ErrorClass::RangeError => "RangeError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct ErrorObject {
    class: ErrorClass,
    message: String,
}

/// An error thrown by host code.
#[derive(Clone)]
pub struct HostError(Arc<ErrorObject>);

impl HostError {
    /// Creates a plain `Error` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_class(ErrorClass::Error, message)
    }

    /// Creates a `TypeError` with the given message.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::with_class(ErrorClass::TypeError, message)
    }

    pub fn with_class(class: ErrorClass, message: impl Into<String>) -> Self {
        HostError(Arc::new(ErrorObject {
            class,
            message: message.into(),
        }))
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn class(&self) -> ErrorClass {
        self.0.class
    }

    /// Returns true if both values refer to the same thrown object.
    pub fn ptr_eq(&self, other: &HostError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.class.as_str(), self.0.message)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for HostError {}
