//! Translation between [`MarshaledValue`] and [`minijinja::Value`].

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value, ValueKind};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::codec;
use crate::error::{ConversionError, Result};
use crate::marshal::{MapKey, MarshaledValue};

/// An integer too wide for the engine's 128-bit integers.
///
/// Renders as its decimal text and converts back losslessly.
#[derive(Debug)]
pub struct WideInt(BigInt);

impl WideInt {
    pub fn value(&self) -> &BigInt {
        &self.0
    }
}

impl Object for WideInt {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        write!(f, "{}", self.0)
    }
}

/// A marshaled map inside the engine. Lookups that miss are noted for the
/// render in progress.
#[derive(Debug)]
pub(crate) struct DataMap(BTreeMap<Value, Value>);

impl DataMap {
    fn lookup(&self, key: &Value) -> Option<Value> {
        self.0.get(key).filter(|item| !item.is_undefined()).cloned()
    }
}

impl Object for DataMap {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let found = self.lookup(key);
        if found.is_none() {
            note_missing(key);
        }
        found
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.0.keys().cloned().collect())
    }

    fn enumerator_len(self: &Arc<Self>) -> Option<usize> {
        Some(self.0.len())
    }
}

thread_local! {
    // One slot per render in progress on this thread, innermost last.
    static MISSED_KEYS: RefCell<Vec<Option<String>>> = const { RefCell::new(Vec::new()) };
}

/// Tracks the last key lookup that missed while one render runs.
///
/// Renders nest through host callbacks, so each render gets its own slot
/// and releases it on drop.
pub(crate) struct MissedKey(());

impl MissedKey {
    pub(crate) fn track() -> Self {
        MISSED_KEYS.with(|slots| slots.borrow_mut().push(None));
        MissedKey(())
    }

    /// The most recent key that missed in this render.
    pub(crate) fn last(&self) -> Option<String> {
        MISSED_KEYS.with(|slots| slots.borrow().last().cloned().flatten())
    }
}

impl Drop for MissedKey {
    fn drop(&mut self) {
        MISSED_KEYS.with(|slots| {
            slots.borrow_mut().pop();
        });
    }
}

fn note_missing(key: &Value) {
    MISSED_KEYS.with(|slots| {
        if let Some(slot) = slots.borrow_mut().last_mut() {
            *slot = Some(key.to_string());
        }
    });
}

/// Builds the engine value for a marshaled value.
pub(crate) fn to_value(value: &MarshaledValue) -> Result<Value> {
    Ok(match value {
        MarshaledValue::Undefined => Value::UNDEFINED,
        MarshaledValue::Null => Value::from(()),
        MarshaledValue::Bool(b) => Value::from(*b),
        MarshaledValue::Int(n) => Value::from(*n),
        MarshaledValue::UInt(n) => Value::from(*n),
        MarshaledValue::BigInt(words) => wide(codec::decode(words)),
        MarshaledValue::Float(n) => Value::from(*n),
        MarshaledValue::Text(s) => Value::from(s.as_str()),
        MarshaledValue::Seq(items) => Value::from(
            items
                .iter()
                .map(to_value)
                .collect::<Result<Vec<Value>>>()?,
        ),
        MarshaledValue::Map(entries) => Value::from_object(DataMap(
            entries
                .iter()
                .map(|(key, item)| Ok((key_value(key), to_value(item)?)))
                .collect::<Result<BTreeMap<Value, Value>>>()?,
        )),
        MarshaledValue::Unsupported(_) => return Err(ConversionError::UnsupportedValue.into()),
    })
}

fn wide(n: BigInt) -> Value {
    if let Some(signed) = n.to_i128() {
        Value::from(signed)
    } else if let Some(unsigned) = n.to_u128() {
        Value::from(unsigned)
    } else {
        Value::from_object(WideInt(n))
    }
}

fn key_value(key: &MapKey) -> Value {
    match key {
        MapKey::Bool(b) => Value::from(*b),
        MapKey::Int(n) => Value::from(*n),
        MapKey::Text(s) => Value::from(s.as_str()),
    }
}

/// Describes an engine value. Values with no host form become
/// [`MarshaledValue::Unsupported`].
pub(crate) fn from_value(value: &Value) -> MarshaledValue {
    if let Some(wide) = value.downcast_object_ref::<WideInt>() {
        return codec::encode(&wide.0).into();
    }
    match value.kind() {
        ValueKind::Undefined => MarshaledValue::Undefined,
        ValueKind::None => MarshaledValue::Null,
        ValueKind::Bool => MarshaledValue::Bool(value.is_true()),
        ValueKind::Number => number(value),
        ValueKind::String => MarshaledValue::Text(value.as_str().unwrap_or_default().to_string()),
        ValueKind::Seq | ValueKind::Iterable => match value.try_iter() {
            Ok(items) => MarshaledValue::Seq(items.map(|item| from_value(&item)).collect()),
            Err(_) => unsupported(value),
        },
        ValueKind::Map if is_data_map(value) => mapping(value),
        ValueKind::Map => MarshaledValue::Unsupported("object".to_string()),
        _ => unsupported(value),
    }
}

/// Marshaled maps, map literals, `dict` results and keyword arguments.
/// Other objects with a map shape, such as macros, are not data.
fn is_data_map(value: &Value) -> bool {
    value.downcast_object_ref::<DataMap>().is_some()
        || value.downcast_object_ref::<BTreeMap<Value, Value>>().is_some()
        || value.is_kwargs()
}

fn number(value: &Value) -> MarshaledValue {
    if value.is_integer() {
        if let Ok(n) = i64::try_from(value.clone()) {
            return MarshaledValue::Int(n);
        }
        if let Ok(n) = u64::try_from(value.clone()) {
            return MarshaledValue::UInt(n);
        }
        if let Ok(n) = i128::try_from(value.clone()) {
            return codec::encode(&BigInt::from(n)).into();
        }
        if let Ok(n) = u128::try_from(value.clone()) {
            return codec::encode(&BigInt::from(n)).into();
        }
    }
    match f64::try_from(value.clone()) {
        Ok(n) => MarshaledValue::Float(n),
        Err(_) => unsupported(value),
    }
}

fn mapping(value: &Value) -> MarshaledValue {
    let Ok(keys) = value.try_iter() else {
        return unsupported(value);
    };
    let mut entries = BTreeMap::new();
    for key in keys {
        let item = value.get_item(&key).unwrap_or(Value::UNDEFINED);
        entries.insert(map_key(&key), from_value(&item));
    }
    MarshaledValue::Map(entries)
}

fn map_key(key: &Value) -> MapKey {
    match key.kind() {
        ValueKind::String => MapKey::Text(key.as_str().unwrap_or_default().to_string()),
        ValueKind::Bool => MapKey::Bool(key.is_true()),
        ValueKind::Number if key.is_integer() => match i64::try_from(key.clone()) {
            Ok(n) => MapKey::Int(n),
            Err(_) => MapKey::Text(key.to_string()),
        },
        _ => MapKey::Text(key.to_string()),
    }
}

fn unsupported(value: &Value) -> MarshaledValue {
    MarshaledValue::Unsupported(kind_name(value.kind()).to_string())
}

/// Name of an engine value kind as it appears in conversion errors.
pub(crate) fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Undefined => "undefined",
        ValueKind::None => "none",
        ValueKind::Bool => "bool",
        ValueKind::Number => "number",
        ValueKind::String => "string",
        ValueKind::Bytes => "bytes",
        ValueKind::Seq => "sequence",
        ValueKind::Map => "map",
        ValueKind::Iterable => "iterable",
        ValueKind::Plain => "plain object",
        _ => "invalid",
    }
}

/// The root of a render: `dot` is the data, and map entries are visible
/// as top-level names. Anything else falls through to globals.
#[derive(Debug)]
pub(crate) struct RenderContext {
    dot: Value,
    globals: Arc<BTreeSet<String>>,
}

impl RenderContext {
    pub(crate) fn new(dot: Value, globals: Arc<BTreeSet<String>>) -> Value {
        Value::from_object(RenderContext { dot, globals })
    }
}

impl Object for RenderContext {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        if key.as_str() == Some("dot") {
            return Some(self.dot.clone());
        }
        let found = match self.dot.downcast_object_ref::<DataMap>() {
            Some(map) => map.lookup(key),
            None if self.dot.kind() == ValueKind::Map => {
                self.dot.get_item(key).ok().filter(|item| !item.is_undefined())
            }
            None => None,
        };
        let global = key.as_str().is_some_and(|name| self.globals.contains(name));
        if found.is_none() && !global {
            note_missing(key);
        }
        found
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["dot"])
    }
}
