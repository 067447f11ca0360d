//! Property-based tests for value marshaling.
//!
//! Every supported host value must come back observationally equal, both
//! through the marshaler alone and through a real render where the engine
//! hands the value to a host function.

use std::sync::{Arc, Mutex};

use num_bigint::{BigInt, BigUint, Sign};
use proptest::prelude::*;
use textbridge::marshal::{to_engine, to_host};
use textbridge::Template;
use textbridge_host::{HostFunction, HostObject, HostValue, MAX_SAFE_INTEGER};

// ============================================================================
// Strategies
// ============================================================================

/// Integers beyond the safe range, of either sign, up to several words wide.
fn wide_integer() -> impl Strategy<Value = BigInt> {
    (any::<bool>(), prop::collection::vec(any::<u32>(), 1..6)).prop_map(|(negative, digits)| {
        let magnitude = BigUint::from_slice(&digits) + BigUint::from(1u64 << 53);
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, magnitude)
    })
}

fn number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).prop_map(|n| n as f64),
        (any::<i32>(), 1u32..1024).prop_map(|(whole, frac)| whole as f64 + frac as f64 / 1024.0),
        (54i32..1000).prop_map(|exp| 2f64.powi(exp)),
    ]
}

fn leaf() -> impl Strategy<Value = HostValue> {
    prop_oneof![
        Just(HostValue::Null),
        any::<bool>().prop_map(HostValue::Bool),
        number().prop_map(HostValue::Number),
        wide_integer().prop_map(HostValue::BigInt),
        ".{0,12}".prop_map(HostValue::String),
    ]
}

fn host_value() -> impl Strategy<Value = HostValue> {
    leaf().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(HostValue::from),
            prop::collection::btree_map("[a-z0-9]{1,6}", inner, 0..5)
                .prop_map(|entries| HostValue::Object(entries.into_iter().collect())),
        ]
    })
}

/// Renders `{{ capture(dot) }}` and returns what the host function received.
fn through_engine(value: &HostValue) -> HostValue {
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    let template = Template::new("capture");
    template
        .func(
            "capture",
            HostFunction::new(move |args| {
                *slot.lock().unwrap() = args.first().cloned();
                Ok(HostValue::Undefined)
            }),
        )
        .unwrap()
        .parse("{{ capture(dot) }}")
        .unwrap();
    template.execute(value).unwrap();
    let received = seen.lock().unwrap().take();
    received.expect("capture was not called")
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Converting to the engine form and back is lossless.
    #[test]
    fn marshal_round_trip(value in host_value()) {
        let back = to_host(&to_engine(&value).unwrap()).unwrap();
        prop_assert_eq!(back, value);
    }

    /// A value passed through a render into a host function is unchanged.
    #[test]
    fn engine_round_trip(value in host_value()) {
        prop_assert_eq!(through_engine(&value), value);
    }

    /// Wide integers keep magnitude and sign through the engine.
    #[test]
    fn wide_integers_render_exactly(n in wide_integer()) {
        let template = Template::new("n");
        template.parse("{{ n }}").unwrap();
        let data = HostObject::new().with("n", n.clone());
        prop_assert_eq!(template.execute(&data.into()).unwrap(), n.to_string());
    }
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn safe_integers_come_back_as_numbers() {
    for n in [0i64, 1, -1, MAX_SAFE_INTEGER, -MAX_SAFE_INTEGER] {
        let value = HostValue::BigInt(BigInt::from(n));
        assert_eq!(through_engine(&value), HostValue::Number(n as f64));
    }
}

#[test]
fn undefined_and_null_stay_distinct() {
    let value = HostValue::from(vec![HostValue::Undefined, HostValue::Null]);
    assert_eq!(to_host(&to_engine(&value).unwrap()).unwrap(), value);
}
