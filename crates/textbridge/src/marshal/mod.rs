//! Value marshaling between the host and the engine.
//!
//! [`MarshaledValue`] is the tagged intermediate form every value takes while
//! crossing the boundary. [`to_engine`] builds it from a host value;
//! [`to_host`] turns it back into one. The engine side of the translation
//! lives in [`crate::engine`].
//!
//! # Mapping
//!
//! | Host | Marshaled | Back to host |
//! |------|-----------|--------------|
//! | `undefined` | `Undefined` | `undefined` |
//! | `null` | `Null` | `null` |
//! | boolean | `Bool` | boolean |
//! | integral number, abs value at most 2^53 - 1 | `Int` | number |
//! | other number | `Float` | number |
//! | bigint | `Int` / `UInt` / `BigInt` | number in the safe range, bigint beyond |
//! | string | `Text` | string |
//! | array | `Seq` | array |
//! | object | `Map` | object |
//! | symbol, function, native wrapper | error | |
//!
//! Engine values with no host form are captured as `Unsupported` and
//! rejected by [`to_host`].

mod to_engine;
mod to_host;

use std::collections::BTreeMap;

use crate::codec::{EncodedInt, WideWords};

pub use to_engine::to_engine;
pub use to_host::to_host;

/// A value in transit between the host and the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MarshaledValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    BigInt(WideWords),
    Float(f64),
    Text(String),
    Seq(Vec<MarshaledValue>),
    Map(BTreeMap<MapKey, MarshaledValue>),
    /// An engine value with no host mapping, tagged with its kind.
    Unsupported(String),
}

/// Keys allowed in a marshaled map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl MapKey {
    /// The key as the host sees it: all host property keys are text.
    pub fn to_text(&self) -> String {
        match self {
            MapKey::Bool(b) => b.to_string(),
            MapKey::Int(n) => n.to_string(),
            MapKey::Text(s) => s.clone(),
        }
    }
}

impl From<EncodedInt> for MarshaledValue {
    fn from(encoded: EncodedInt) -> Self {
        match encoded {
            EncodedInt::Signed(n) => MarshaledValue::Int(n),
            EncodedInt::Unsigned(n) => MarshaledValue::UInt(n),
            EncodedInt::Wide(words) => MarshaledValue::BigInt(words),
        }
    }
}

impl From<&str> for MarshaledValue {
    fn from(s: &str) -> Self {
        MarshaledValue::Text(s.to_string())
    }
}

/// Per-crossing conversion state.
///
/// One context lives on the stack for each conversion call and is dropped
/// when the call returns, so nested crossings never share state.
#[derive(Debug, Default)]
pub(crate) struct ConversionContext {
    depth: usize,
}

impl ConversionContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
