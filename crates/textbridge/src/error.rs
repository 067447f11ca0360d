//! Error types for the bridge.
//!
//! Every fallible operation returns [`Error`]. The variants partition failures
//! by where they were detected, and each keeps the text its source produced:
//! engine messages are never rewritten, host errors keep their identity, and
//! engine faults read `caught panic: <message>`.
//!
//! All error types are `Clone + Send + Sync`. Errors raised inside a template
//! callback travel through the engine as the `source` of a
//! [`minijinja::Error`] and are recovered unchanged on the way out.

use std::fmt;
use std::io;
use std::sync::Arc;

use minijinja::ErrorKind;
use textbridge_host::HostError;

/// Failure to map a value across the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// A host value with no engine mapping (symbol, function, native wrapper).
    #[error("Unsupported value type")]
    UnsupportedValue,

    /// An engine value with no host mapping.
    #[error("can't convert engine value of type {0}")]
    UnsupportedEngineValue(String),

    /// A function map argument that is null or undefined.
    #[error("Cannot convert undefined or null to object")]
    NotAnObject,

    /// A function map argument that is a primitive.
    #[error("An object was expected")]
    ExpectedObject,

    /// A function map entry that is not callable.
    #[error("Key '{0}' is not a function")]
    NotAFunction(String),
}

/// Failure while reading template files.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("pattern matches no files: `{0}`")]
    NoMatches(String),

    #[error("no files named in call to ParseFiles")]
    NoFiles,

    #[error("syntax error in pattern `{0}`")]
    BadPattern(String),
}

impl LoadError {
    pub(crate) fn read(path: impl Into<String>, source: io::Error) -> Self {
        LoadError::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// An error reported by the template engine, kept as the engine produced it.
#[derive(Debug, Clone)]
pub struct EngineError(Arc<minijinja::Error>);

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    /// The underlying engine error.
    pub fn inner(&self) -> &minijinja::Error {
        &self.0
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        EngineError(Arc::new(err))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

/// Error type for all bridge operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A required argument had the wrong host type.
    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Syntax errors, unknown functions or templates, strict-mode lookups.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An error thrown by host code, passed through with its identity intact.
    #[error(transparent)]
    Host(#[from] HostError),

    /// An engine fault or a panic caught at the boundary.
    #[error("caught panic: {0}")]
    Panic(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl Error {
    /// The type error raised when a text argument is missing or not a string.
    pub fn expected_string() -> Self {
        Error::Argument("A string was expected".to_string())
    }

    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            Error::Host(err) => Some(err),
            _ => None,
        }
    }

    pub fn engine_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Engine(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Converts into the error object thrown to host code.
    ///
    /// Host errors come back as the original object. Argument failures
    /// become type errors; everything else is a plain error carrying this
    /// error's message.
    pub fn into_host_error(self) -> HostError {
        match self {
            Error::Host(err) => err,
            Error::Argument(msg) => HostError::type_error(msg),
            Error::Conversion(ConversionError::NotAnObject) => {
                HostError::type_error(ConversionError::NotAnObject.to_string())
            }
            other => HostError::new(other.to_string()),
        }
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::Engine(EngineError::from(err))
    }
}

/// Result alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_display() {
        let err = Error::Panic("unrecognized option: nope".into());
        assert_eq!(err.to_string(), "caught panic: unrecognized option: nope");
    }

    #[test]
    fn test_conversion_messages() {
        assert_eq!(
            Error::from(ConversionError::UnsupportedValue).to_string(),
            "Unsupported value type"
        );
        assert_eq!(
            Error::from(ConversionError::NotAFunction("invalid".into())).to_string(),
            "Key 'invalid' is not a function"
        );
        assert_eq!(
            ConversionError::UnsupportedEngineValue("bytes".into()).to_string(),
            "can't convert engine value of type bytes"
        );
    }

    #[test]
    fn test_engine_message_is_unchanged() {
        let inner = minijinja::Error::new(ErrorKind::UndefinedError, "x is missing");
        let expected = inner.to_string();
        let err = Error::from(inner);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.engine_kind(), Some(ErrorKind::UndefinedError));
    }

    #[test]
    fn test_into_host_error_keeps_identity() {
        let thrown = HostError::new("custom");
        let back = Error::Host(thrown.clone()).into_host_error();
        assert!(back.ptr_eq(&thrown));
    }

    #[test]
    fn test_argument_becomes_type_error() {
        let err = Error::expected_string().into_host_error();
        assert_eq!(err.class(), textbridge_host::ErrorClass::TypeError);
        assert_eq!(err.message(), "A string was expected");
    }

    #[test]
    fn test_read_error_mentions_path() {
        let err = LoadError::read(
            "/nope/a.tmpl",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "open /nope/a.tmpl: No such file or directory"
        );
    }
}
