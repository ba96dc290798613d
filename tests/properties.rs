//! Model-based property tests.
//!
//! Every table must agree with `std::collections::HashMap` over arbitrary
//! operation sequences, modulo the family's insert semantics: `insert`
//! never overwrites and `update` never creates.

use std::collections::HashMap;

use proptest::prelude::*;
use rand::seq::SliceRandom;

use baklava::{IdentityBuildHasher, QuadMap, RobinMap};

#[cfg(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
))]
use baklava::DenseMap;

#[derive(Debug, Clone)]
enum Op {
    Insert(u32, u64),
    Update(u32, u64),
    Remove(u32),
    Get(u32),
    Contains(u32),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    // Keys draw from a small space so sequences revisit and collide.
    let key = 0..64_u32;
    let value = 0..1_000_u64;
    prop_oneof![
        4 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), value).prop_map(|(k, v)| Op::Update(k, v)),
        2 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => key.prop_map(Op::Contains),
        1 => Just(Op::Clear),
    ]
}

/// Apply `op` to the model, returning the observation the table must
/// reproduce: the operation's own result plus the value for `Get`.
fn apply_to_model(model: &mut HashMap<u32, u64>, op: &Op) -> (bool, Option<u64>) {
    match *op {
        Op::Insert(k, v) => {
            if model.contains_key(&k) {
                (false, None)
            } else {
                model.insert(k, v);
                (true, None)
            }
        }
        Op::Update(k, v) => {
            if let Some(value) = model.get_mut(&k) {
                *value = v;
                (true, None)
            } else {
                (false, None)
            }
        }
        Op::Remove(k) => (model.remove(&k).is_some(), None),
        Op::Get(k) => (model.contains_key(&k), model.get(&k).copied()),
        Op::Contains(k) => (model.contains_key(&k), None),
        Op::Clear => {
            model.clear();
            (true, None)
        }
    }
}

macro_rules! check_table {
    ($ops:expr, $map:expr, $model:expr, |$m:ident, $k:ident| $get:expr, $apply:expr) => {
        for op in $ops.iter() {
            let expected = apply_to_model(&mut $model, op);
            let actual = $apply(&mut $map, op);
            prop_assert_eq!(expected.0, actual.0, "disagreement on {:?}", op);
            prop_assert_eq!(expected.1, actual.1, "value disagreement on {:?}", op);
            prop_assert_eq!($map.len(), $model.len(), "count diverged after {:?}", op);
        }
        // Final state: iteration yields exactly the model's entries.
        let mut entries = $map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>();
        entries.sort_unstable();
        let mut expected = $model.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>();
        expected.sort_unstable();
        prop_assert_eq!(entries, expected);
        for ($k, &v) in $model.iter() {
            let $m = &$map;
            prop_assert_eq!($get, Some(&v));
        }
    };
}

proptest! {
    #[cfg(any(
        target_arch = "x86_64",
        all(target_arch = "x86", target_feature = "sse2"),
        all(target_arch = "aarch64", target_feature = "neon")
    ))]
    #[test]
    fn dense_agrees_with_model(ops in prop::collection::vec(op(), 1..256)) {
        let mut map = DenseMap::with_capacity_and_hasher(16, IdentityBuildHasher)
            .expect("simd support required");
        let mut model = HashMap::new();
        check_table!(ops, map, model, |m, k| m.get(k), |map: &mut DenseMap<u32, u64, _>, op: &Op| {
            match *op {
                Op::Insert(k, v) => (map.insert(k, v), None),
                Op::Update(k, v) => (map.update(&k, v), None),
                Op::Remove(k) => (map.remove(&k), None),
                Op::Get(k) => (map.get(&k).is_some(), map.get(&k).copied()),
                Op::Contains(k) => (map.contains(&k), None),
                Op::Clear => {
                    map.clear();
                    (true, None)
                }
            }
        });
    }

    #[test]
    fn quad_agrees_with_model(ops in prop::collection::vec(op(), 1..256)) {
        let mut map = QuadMap::with_capacity_and_hasher(8, IdentityBuildHasher);
        let mut model = HashMap::new();
        check_table!(ops, map, model, |m, k| m.get(k), |map: &mut QuadMap<u32, u64, _>, op: &Op| {
            match *op {
                Op::Insert(k, v) => (map.insert(k, v), None),
                Op::Update(k, v) => (map.update(&k, v), None),
                Op::Remove(k) => (map.remove(&k), None),
                Op::Get(k) => (map.get(&k).is_some(), map.get(&k).copied()),
                Op::Contains(k) => (map.contains(&k), None),
                Op::Clear => {
                    map.clear();
                    (true, None)
                }
            }
        });
    }

    #[test]
    fn robin_agrees_with_model(ops in prop::collection::vec(op(), 1..256)) {
        let mut map = RobinMap::new();
        let mut model = HashMap::new();
        check_table!(ops, map, model, |m, k| m.get(*k), |map: &mut RobinMap<u32, u64>, op: &Op| {
            match *op {
                Op::Insert(k, v) => (map.insert(k, v), None),
                Op::Update(k, v) => (map.update(k, v), None),
                Op::Remove(k) => (map.remove(k), None),
                Op::Get(k) => (map.get(k).is_some(), map.get(k).copied()),
                Op::Contains(k) => (map.contains(k), None),
                Op::Clear => {
                    map.clear();
                    (true, None)
                }
            }
        });
    }

    #[test]
    fn quad_rehash_preserves_every_entry(keys in prop::collection::hash_set(any::<u32>(), 1..400)) {
        let mut map = QuadMap::with_capacity_and_hasher(8, IdentityBuildHasher);
        for &key in keys.iter() {
            prop_assert!(map.insert(key, u64::from(key) ^ 0xA5A5));
        }
        prop_assert_eq!(map.len(), keys.len());
        for &key in keys.iter() {
            prop_assert_eq!(map.get(&key), Some(&(u64::from(key) ^ 0xA5A5)));
        }
    }

    #[test]
    fn robin_rehash_preserves_every_entry(keys in prop::collection::hash_set(any::<u32>(), 1..400)) {
        let mut map = RobinMap::new();
        for &key in keys.iter() {
            prop_assert!(map.insert(key, u64::from(key) ^ 0x5A5A));
        }
        prop_assert_eq!(map.len(), keys.len());
        for &key in keys.iter() {
            prop_assert_eq!(map.get(key), Some(&(u64::from(key) ^ 0x5A5A)));
        }
    }
}

#[cfg(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
))]
#[test]
fn dense_survives_shuffled_churn() {
    let mut keys = (0..512_u32).collect::<Vec<_>>();
    let mut rng = rand::rng();
    keys.shuffle(&mut rng);

    let mut map = DenseMap::with_capacity_and_hasher(16, IdentityBuildHasher)
        .expect("simd support required");
    for &key in keys.iter() {
        assert!(map.insert(key, u64::from(key)));
    }
    keys.shuffle(&mut rng);
    for &key in keys.iter().take(256) {
        assert!(map.remove(&key));
    }
    assert_eq!(map.len(), 256);
    for &key in keys.iter().take(256) {
        assert!(!map.contains(&key));
    }
    for &key in keys.iter().skip(256) {
        assert_eq!(map.get(&key), Some(&u64::from(key)));
    }
}

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
)))]
#[test]
fn dense_construction_reports_unsupported_platform() {
    let result: Result<baklava::DenseMap<u32, u64>, _> = baklava::DenseMap::new();
    assert_eq!(result.unwrap_err(), baklava::Error::UnsupportedPlatform);
}
