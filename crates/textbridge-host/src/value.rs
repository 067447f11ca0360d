//! The host's dynamic value type.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::function::HostFunction;
use crate::object::{HostArray, HostObject};

/// Largest integer a host number holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// A dynamically-typed host value.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    /// IEEE-754 double, the host's only native number type.
    Number(f64),
    BigInt(BigInt),
    String(String),
    Symbol(Symbol),
    Array(HostArray),
    Object(HostObject),
    Function(HostFunction),
    /// An opaque native object wrapped for the host.
    External(External),
}

impl HostValue {
    /// The host's `typeof` name for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "object",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::BigInt(_) => "bigint",
            HostValue::String(_) => "string",
            HostValue::Symbol(_) => "symbol",
            HostValue::Array(_) | HostValue::Object(_) | HostValue::External(_) => "object",
            HostValue::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            HostValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            HostValue::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_external(&self) -> Option<&External> {
        match self {
            HostValue::External(external) => Some(external),
            _ => None,
        }
    }

    /// The exact integer this value denotes, if any: a bigint, or an
    /// integral number.
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            HostValue::BigInt(n) => Some(n.clone()),
            HostValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                n.to_i128().map(BigInt::from)
            }
            _ => None,
        }
    }

    /// Host number for integers in the safe range, bigint beyond it.
    pub fn from_integer(n: BigInt) -> HostValue {
        match n.to_i64() {
            Some(small) if small.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => {
                HostValue::Number(small as f64)
            }
            _ => HostValue::BigInt(n),
        }
    }
}

impl PartialEq for HostValue {
    /// Strict equality, except that containers compare structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::BigInt(a), HostValue::BigInt(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Symbol(a), HostValue::Symbol(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            (HostValue::Function(a), HostValue::Function(b)) => a.ptr_eq(b),
            (HostValue::External(a), HostValue::External(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// A unique, opaque symbol.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

impl Symbol {
    pub fn new(description: Option<&str>) -> Self {
        Symbol {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.map(Arc::from),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// A native object exposed to the host as an opaque wrapper.
#[derive(Clone)]
pub struct External(Arc<dyn Any + Send + Sync>);

impl External {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        External(Arc::new(value))
    }

    /// Unwraps the native object if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &External) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[External]")
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(f64::from(n))
    }
}

impl From<u32> for HostValue {
    fn from(n: u32) -> Self {
        HostValue::Number(f64::from(n))
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::from_integer(BigInt::from(n))
    }
}

impl From<u64> for HostValue {
    fn from(n: u64) -> Self {
        HostValue::from_integer(BigInt::from(n))
    }
}

impl From<BigInt> for HostValue {
    fn from(n: BigInt) -> Self {
        HostValue::BigInt(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<Symbol> for HostValue {
    fn from(symbol: Symbol) -> Self {
        HostValue::Symbol(symbol)
    }
}

impl From<HostArray> for HostValue {
    fn from(array: HostArray) -> Self {
        HostValue::Array(array)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(values: Vec<HostValue>) -> Self {
        HostValue::Array(values.into_iter().collect())
    }
}

impl From<HostObject> for HostValue {
    fn from(object: HostObject) -> Self {
        HostValue::Object(object)
    }
}

impl From<HostFunction> for HostValue {
    fn from(function: HostFunction) -> Self {
        HostValue::Function(function)
    }
}

impl From<External> for HostValue {
    fn from(external: External) -> Self {
        HostValue::External(external)
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::Null
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => HostValue::Null,
            serde_json::Value::Bool(b) => HostValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    HostValue::from(i)
                } else if let Some(u) = n.as_u64() {
                    HostValue::from(u)
                } else {
                    HostValue::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => HostValue::String(s),
            serde_json::Value::Array(items) => {
                HostValue::Array(items.into_iter().map(HostValue::from).collect())
            }
            serde_json::Value::Object(map) => HostValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, HostValue::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_integer_picks_representation() {
        assert_eq!(HostValue::from(42i64), HostValue::Number(42.0));
        assert_eq!(
            HostValue::from(MAX_SAFE_INTEGER + 1),
            HostValue::BigInt(BigInt::from(MAX_SAFE_INTEGER + 1))
        );
        assert_eq!(
            HostValue::from(u64::MAX),
            HostValue::BigInt(BigInt::from(u64::MAX))
        );
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(HostValue::Number(3.0).to_integer(), Some(BigInt::from(3)));
        assert_eq!(HostValue::Number(3.5).to_integer(), None);
        assert_eq!(HostValue::Number(f64::NAN).to_integer(), None);
        assert_eq!(HostValue::from("3").to_integer(), None);
    }

    #[test]
    fn test_symbols_are_unique() {
        let a = Symbol::new(Some("x"));
        let b = Symbol::new(Some("x"));
        assert_ne!(HostValue::from(a.clone()), HostValue::from(b));
        assert_eq!(HostValue::from(a.clone()), HostValue::from(a));
    }

    #[test]
    fn test_type_of() {
        assert_eq!(HostValue::Null.type_of(), "object");
        assert_eq!(HostValue::Undefined.type_of(), "undefined");
        assert_eq!(HostValue::from(BigInt::from(1)).type_of(), "bigint");
        assert_eq!(HostValue::from(Symbol::new(None)).type_of(), "symbol");
    }

    #[test]
    fn test_from_json() {
        let value = HostValue::from(json!({"a": [1, "two", null], "b": true}));
        let object = value.as_object().unwrap();
        assert_eq!(object.get("b").unwrap(), HostValue::Bool(true));
        let a = object.get("a").unwrap();
        let array = a.as_array().unwrap();
        assert_eq!(array.get(0).unwrap(), HostValue::Number(1.0));
        assert_eq!(array.get(1).unwrap(), HostValue::from("two"));
        assert_eq!(array.get(2).unwrap(), HostValue::Null);
    }

    #[test]
    fn test_external_downcast() {
        let external = External::new(17u8);
        assert_eq!(external.downcast_ref::<u8>(), Some(&17));
        assert!(external.downcast_ref::<String>().is_none());
    }
}
