use textbridge_host::{HostArray, HostObject, HostValue};

use super::MarshaledValue;
use crate::codec;
use crate::error::{ConversionError, Result};

/// Converts a marshaled engine value into a host value.
///
/// Integers come back as host numbers inside the safe range and as bigints
/// beyond it. `Unsupported` values anywhere in the graph are rejected.
pub fn to_host(value: &MarshaledValue) -> Result<HostValue> {
    Ok(match value {
        MarshaledValue::Undefined => HostValue::Undefined,
        MarshaledValue::Null => HostValue::Null,
        MarshaledValue::Bool(b) => HostValue::Bool(*b),
        MarshaledValue::Int(n) => HostValue::from(*n),
        MarshaledValue::UInt(n) => HostValue::from(*n),
        MarshaledValue::BigInt(words) => HostValue::from_integer(codec::decode(words)),
        MarshaledValue::Float(n) => HostValue::Number(*n),
        MarshaledValue::Text(s) => HostValue::String(s.clone()),
        MarshaledValue::Seq(items) => {
            let mut array = HostArray::new();
            for item in items {
                array.push(to_host(item)?);
            }
            HostValue::Array(array)
        }
        MarshaledValue::Map(entries) => {
            let mut object = HostObject::new();
            for (key, item) in entries {
                object.insert(key.to_text(), to_host(item)?);
            }
            HostValue::Object(object)
        }
        MarshaledValue::Unsupported(kind) => {
            return Err(ConversionError::UnsupportedEngineValue(kind.clone()).into())
        }
    })
}
