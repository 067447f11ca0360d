//! Property tests for own-key enumeration order.

use proptest::prelude::*;
use textbridge_host::{HostObject, HostValue};

proptest! {
    /// Index keys come first in ascending order, then named keys in
    /// insertion order.
    #[test]
    fn index_keys_ascend_before_named_keys(
        indices in prop::collection::btree_set(0u32..10_000, 0..8),
        names in prop::collection::vec("[a-z][a-z0-9]{0,5}", 0..8),
        order in prop::collection::vec(any::<bool>(), 16),
    ) {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        // Index keys are inserted in descending order, interleaved with names.
        let mut index_keys = indices.iter().rev().map(u32::to_string);
        let mut named = unique.iter().cloned();
        let mut object = HostObject::new();
        for take_index in order.into_iter().chain(std::iter::repeat(true)) {
            let key = if take_index {
                index_keys.next().or_else(|| named.next())
            } else {
                named.next().or_else(|| index_keys.next())
            };
            match key {
                Some(key) => object.insert(key, HostValue::Null),
                None => break,
            }
        }

        let mut expected: Vec<String> = indices.iter().map(u32::to_string).collect();
        expected.extend(unique.iter().cloned());
        prop_assert_eq!(object.own_keys().unwrap(), expected);
    }

    /// Redefining a key keeps its original position.
    #[test]
    fn redefinition_keeps_position(names in prop::collection::btree_set("[a-z]{1,4}", 2..6)) {
        let names: Vec<String> = names.into_iter().collect();
        let mut object: HostObject = names.iter().map(|name| (name.clone(), 1)).collect();
        object.insert(names[0].clone(), 2);
        prop_assert_eq!(object.own_keys().unwrap(), names.clone());
        prop_assert_eq!(object.get(&names[0]).unwrap(), HostValue::from(2));
    }
}
