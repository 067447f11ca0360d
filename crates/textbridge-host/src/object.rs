//! Keyed and indexed host structures.
//!
//! Slots in a [`HostObject`] or [`HostArray`] are [`Property`] values: either
//! plain data or an accessor whose getter runs on every read and may throw.
//! Objects may also carry an own-keys trap that replaces key enumeration, the
//! way a proxy does. Both failure paths surface as the thrown [`HostError`].

use std::fmt;
use std::sync::Arc;

use crate::error::HostError;
use crate::value::HostValue;

type GetterFn = dyn Fn() -> Result<HostValue, HostError> + Send + Sync;
type KeysFn = dyn Fn() -> Result<Vec<String>, HostError> + Send + Sync;

/// An accessor property's getter.
#[derive(Clone)]
pub struct Getter(Arc<GetterFn>);

impl Getter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        Getter(Arc::new(f))
    }

    pub fn get(&self) -> Result<HostValue, HostError> {
        (self.0)()
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Getter]")
    }
}

/// A single slot of an object or array.
#[derive(Debug, Clone)]
pub enum Property {
    Data(HostValue),
    Accessor(Getter),
}

impl Property {
    /// Reads the slot, running the getter for accessors.
    pub fn read(&self) -> Result<HostValue, HostError> {
        match self {
            Property::Data(value) => Ok(value.clone()),
            Property::Accessor(getter) => getter.get(),
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Property::Data(a), Property::Data(b)) => a == b,
            (Property::Accessor(a), Property::Accessor(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

/// A host object: string-keyed properties in insertion order.
#[derive(Clone, Default)]
pub struct HostObject {
    properties: Vec<(String, Property)>,
    keys_trap: Option<Arc<KeysFn>>,
}

impl HostObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a data property. Re-setting an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HostValue>) {
        self.define(key.into(), Property::Data(value.into()));
    }

    /// Defines an accessor property.
    pub fn define_getter<F>(&mut self, key: impl Into<String>, getter: F)
    where
        F: Fn() -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.define(key.into(), Property::Accessor(Getter::new(getter)));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_getter<F>(mut self, key: impl Into<String>, getter: F) -> Self
    where
        F: Fn() -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.define_getter(key, getter);
        self
    }

    /// Installs a trap that replaces own-key enumeration.
    pub fn with_keys_trap<F>(mut self, trap: F) -> Self
    where
        F: Fn() -> Result<Vec<String>, HostError> + Send + Sync + 'static,
    {
        self.keys_trap = Some(Arc::new(trap));
        self
    }

    fn define(&mut self, key: String, property: Property) {
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = property,
            None => self.properties.push((key, property)),
        }
    }

    /// Enumerates own keys: array-index keys ascending, then the remaining
    /// keys in insertion order.
    pub fn own_keys(&self) -> Result<Vec<String>, HostError> {
        if let Some(trap) = &self.keys_trap {
            return trap();
        }
        let mut indexed: Vec<(u32, &str)> = Vec::new();
        let mut named: Vec<&str> = Vec::new();
        for (key, _) in &self.properties {
            match array_index(key) {
                Some(index) => indexed.push((index, key)),
                None => named.push(key),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed
            .into_iter()
            .map(|(_, key)| key)
            .chain(named)
            .map(str::to_string)
            .collect())
    }

    /// Reads a property. Missing keys read as undefined.
    pub fn get(&self, key: &str) -> Result<HostValue, HostError> {
        match self.property(key) {
            Some(property) => property.read(),
            None => Ok(HostValue::Undefined),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, property)| property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Canonical array index: a decimal without leading zeros below 2^32 - 1.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        let traps_match = match (&self.keys_trap, &other.keys_trap) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        traps_match
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .all(|(key, property)| other.property(key) == Some(property))
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, property) in &self.properties {
            match property {
                Property::Data(value) => map.entry(key, value),
                Property::Accessor(getter) => map.entry(key, getter),
            };
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<HostValue>> FromIterator<(K, V)> for HostObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = HostObject::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

/// A host array. Elements may be accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostArray {
    elements: Vec<Property>,
}

impl HostArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<HostValue>) {
        self.elements.push(Property::Data(value.into()));
    }

    pub fn push_getter<F>(&mut self, getter: F)
    where
        F: Fn() -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.elements.push(Property::Accessor(Getter::new(getter)));
    }

    /// Reads an element. Out-of-range reads are undefined.
    pub fn get(&self, index: usize) -> Result<HostValue, HostError> {
        match self.elements.get(index) {
            Some(property) => property.read(),
            None => Ok(HostValue::Undefined),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<V: Into<HostValue>> FromIterator<V> for HostArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        HostArray {
            elements: iter
                .into_iter()
                .map(|value| Property::Data(value.into()))
                .collect(),
        }
    }
}
