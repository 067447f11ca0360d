//! Host callables.

use std::fmt;
use std::sync::Arc;

use crate::error::HostError;
use crate::value::HostValue;

type Callable = dyn Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync;

/// A function value owned by the host runtime.
///
/// Calls are synchronous and variadic: the callee receives every argument in
/// order and either returns a value or throws a [`HostError`].
///
/// ```rust
/// use textbridge_host::{HostFunction, HostValue};
///
/// let shout = HostFunction::new(|args| {
///     let text = args.first().and_then(HostValue::as_str).unwrap_or_default();
///     Ok(HostValue::from(text.to_uppercase()))
/// });
/// assert_eq!(shout.call(&["hi".into()]).unwrap(), HostValue::from("HI"));
/// ```
#[derive(Clone)]
pub struct HostFunction {
    name: Option<Arc<str>>,
    callable: Arc<Callable>,
}

impl HostFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        HostFunction {
            name: None,
            callable: Arc::new(f),
        }
    }

    /// Same as [`HostFunction::new`] but records a display name.
    pub fn named<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        HostFunction {
            name: Some(Arc::from(name)),
            callable: Arc::new(f),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn call(&self, args: &[HostValue]) -> Result<HostValue, HostError> {
        (self.callable)(args)
    }

    pub fn ptr_eq(&self, other: &HostFunction) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[Function: {}]", name),
            None => f.write_str("[Function (anonymous)]"),
        }
    }
}
