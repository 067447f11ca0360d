use std::collections::BTreeMap;

use textbridge_host::{HostArray, HostObject, HostValue, MAX_SAFE_INTEGER};
use tracing::trace;

use super::{ConversionContext, MapKey, MarshaledValue};
use crate::codec;
use crate::error::{ConversionError, Result};

/// Converts a host value for use as engine data.
///
/// Conversion stops at the first value with no engine mapping, wherever it
/// sits in the graph. A getter or key enumeration that throws aborts the
/// conversion with that same host error.
pub fn to_engine(value: &HostValue) -> Result<MarshaledValue> {
    convert(value, &mut ConversionContext::new())
}

fn convert(value: &HostValue, cx: &mut ConversionContext) -> Result<MarshaledValue> {
    Ok(match value {
        HostValue::Undefined => MarshaledValue::Undefined,
        HostValue::Null => MarshaledValue::Null,
        HostValue::Bool(b) => MarshaledValue::Bool(*b),
        HostValue::Number(n) => number(*n),
        HostValue::BigInt(n) => codec::encode(n).into(),
        HostValue::String(s) => MarshaledValue::Text(s.clone()),
        HostValue::Array(array) => sequence(array, cx)?,
        HostValue::Object(object) => mapping(object, cx)?,
        HostValue::Symbol(_) | HostValue::Function(_) | HostValue::External(_) => {
            trace!(
                type_of = value.type_of(),
                depth = cx.depth(),
                "rejecting host value"
            );
            return Err(ConversionError::UnsupportedValue.into());
        }
    })
}

fn number(n: f64) -> MarshaledValue {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        MarshaledValue::Int(n as i64)
    } else {
        MarshaledValue::Float(n)
    }
}

fn sequence(array: &HostArray, cx: &mut ConversionContext) -> Result<MarshaledValue> {
    cx.enter();
    let mut items = Vec::with_capacity(array.len());
    for index in 0..array.len() {
        let item = array.get(index)?;
        items.push(convert(&item, cx)?);
    }
    cx.leave();
    Ok(MarshaledValue::Seq(items))
}

fn mapping(object: &HostObject, cx: &mut ConversionContext) -> Result<MarshaledValue> {
    cx.enter();
    let mut entries = BTreeMap::new();
    for key in object.own_keys()? {
        let item = object.get(&key)?;
        let converted = convert(&item, cx)?;
        entries.insert(MapKey::Text(key), converted);
    }
    cx.leave();
    Ok(MarshaledValue::Map(entries))
}
