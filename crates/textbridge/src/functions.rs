//! Function bridge: host callables as engine functions.
//!
//! Every entry of a namespace's function table is a [`FunctionBinding`].
//! Host bindings are installed as engine objects whose `call` runs the
//! uniform invocation contract:
//!
//! 1. every engine argument is marshaled to the host, in order;
//! 2. the host callable runs synchronously;
//! 3. its return value is marshaled back into the engine.
//!
//! If step 1 fails the callable never runs. A failure at any step travels up
//! through the engine as the source of a [`minijinja::Error`] and is
//! recovered by [`recover`] at the render boundary, so a thrown
//! [`HostError`](textbridge_host::HostError) reaches the caller as the very
//! same object.

use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, ObjectRepr, Value};
use minijinja::{ErrorKind, State};
use textbridge_host::{HostFunction, HostValue};
use tracing::trace;

use crate::engine::value::{from_value, to_value};
use crate::engine::{EngineFailure, EngineResult};
use crate::error::{ConversionError, Error, Result};
use crate::marshal::{self, MarshaledValue};

/// A named entry in a function table.
#[derive(Debug, Clone)]
pub enum FunctionBinding {
    /// A host callable.
    Host(HostFunction),
    /// An engine-native callable, such as a library function.
    Engine(Value),
}

impl FunctionBinding {
    /// The value installed as an engine global under `name`.
    pub(crate) fn to_value(&self, name: &str) -> Value {
        match self {
            FunctionBinding::Host(function) => Value::from_object(HostCall {
                name: name.to_string(),
                function: function.clone(),
            }),
            FunctionBinding::Engine(value) => value.clone(),
        }
    }

    pub(crate) fn origin(&self) -> &'static str {
        match self {
            FunctionBinding::Host(_) => "host",
            FunctionBinding::Engine(_) => "engine",
        }
    }

    pub fn as_host(&self) -> Option<&HostFunction> {
        match self {
            FunctionBinding::Host(function) => Some(function),
            FunctionBinding::Engine(_) => None,
        }
    }
}

/// Runs a host callable on marshaled arguments.
pub fn invoke(function: &HostFunction, args: &[MarshaledValue]) -> Result<MarshaledValue> {
    let host_args = args
        .iter()
        .map(marshal::to_host)
        .collect::<Result<Vec<HostValue>>>()?;
    let result = function.call(&host_args)?;
    marshal::to_engine(&result)
}

#[derive(Debug)]
struct HostCall {
    name: String,
    function: HostFunction,
}

impl Object for HostCall {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(
        self: &Arc<Self>,
        _state: &State,
        args: &[Value],
    ) -> std::result::Result<Value, minijinja::Error> {
        trace!(function = %self.name, argc = args.len(), "calling host function");
        let args: Vec<MarshaledValue> = args.iter().map(from_value).collect();
        invoke(&self.function, &args)
            .and_then(|result| to_value(&result))
            .map_err(carry)
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        write!(f, "<function {}>", self.name)
    }
}

/// A bridge error riding through the engine as an error source.
#[derive(Debug)]
struct Carried(Error);

impl fmt::Display for Carried {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Carried {}

/// Wraps a bridge error so it can cross the engine.
pub(crate) fn carry(err: Error) -> minijinja::Error {
    let kind = err.engine_kind().unwrap_or(ErrorKind::InvalidOperation);
    minijinja::Error::new(kind, err.to_string()).with_source(Carried(err))
}

/// Recovers the bridge error carried by an engine error, if there is one.
pub(crate) fn recover(err: minijinja::Error) -> Error {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(Carried(inner)) = current.downcast_ref::<Carried>() {
            return inner.clone();
        }
        source = current.source();
    }
    Error::from(err)
}

/// Checks a function name against the engine's identifier grammar.
pub(crate) fn validate_name(name: &str) -> EngineResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EngineFailure::Fault(format!(
            "function name {:?} is not a valid identifier",
            name
        )))
    }
}

/// Reads a host function map into bindings.
///
/// Undefined entries are skipped. Getter failures propagate as thrown.
pub(crate) fn bindings_from_map(map: &HostValue) -> Result<Vec<(String, FunctionBinding)>> {
    let object = match map {
        HostValue::Undefined | HostValue::Null => return Err(ConversionError::NotAnObject.into()),
        HostValue::Object(object) => object,
        _ => return Err(ConversionError::ExpectedObject.into()),
    };
    let mut bindings = Vec::new();
    for key in object.own_keys()? {
        match object.get(&key)? {
            HostValue::Undefined => continue,
            HostValue::Function(function) => bindings.push((key, FunctionBinding::Host(function))),
            _ => return Err(ConversionError::NotAFunction(key).into()),
        }
    }
    Ok(bindings)
}
