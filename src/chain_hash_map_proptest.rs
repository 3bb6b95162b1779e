// Property tests for ChainHashMap kept inside the crate so they can inspect
// cursor state and slot counts directly.

use crate::chain_hash_map::ChainHashMap;
use crate::config::{GrowthPolicy, MapConfig};
use crate::error::MapError;
use crate::hash::HashFn;
use crate::pair::Pair;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Find(usize),
    Remove(usize),
    Lookup(Vec<u8>),
    Enumerate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<Op>)> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..6), 1..=10).prop_flat_map(
        |pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
                1 => idx.clone().prop_map(Op::Get),
                1 => idx.clone().prop_map(Op::Find),
                2 => idx.clone().prop_map(Op::Remove),
                1 => proptest::collection::vec(any::<u8>(), 0..6).prop_map(Op::Lookup),
                1 => Just(Op::Enumerate),
            ];
            proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

fn const_hash(_: &[u8]) -> u32 {
    7
}

fn low_entropy_hash(key: &[u8]) -> u32 {
    key.first().copied().map(u32::from).unwrap_or(0)
}

/// Walk the shared cursor to the end, returning every yielded key.
fn drain_cursor(sut: &mut ChainHashMap<Vec<u8>, i32>) -> Result<Vec<Vec<u8>>, TestCaseError> {
    prop_assert_eq!(sut.iterate(true), Ok(None));
    let mut keys = Vec::new();
    loop {
        match sut.iterate(false) {
            Ok(Some(p)) => keys.push(p.key.clone()),
            Ok(None) => prop_assert!(false, "only a reset yields no pair"),
            Err(MapError::EndOfIteration) => break,
            Err(e) => prop_assert!(false, "unexpected cursor error: {}", e),
        }
    }
    // Terminal until the next reset.
    prop_assert_eq!(sut.iterate(false), Err(MapError::EndOfIteration));
    Ok(keys)
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Put of a new key grows size by one; re-put replaces, keeps size, and
//   destroys the displaced pair exactly once.
// - Get/Find agree with each other and with the model.
// - Remove of a present key destroys it and shrinks size by one; of an
//   absent key, reports `KeyNotFound`.
// - A cursor walk yields every live key exactly once, then `EndOfIteration`.
// - Empty keys are rejected by every keyed operation.
fn run_state_machine(
    config: MapConfig,
    pool: Vec<Vec<u8>>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut sut: ChainHashMap<Vec<u8>, i32> = ChainHashMap::with_config(config).unwrap();
    let mut model: HashMap<Vec<u8>, i32> = HashMap::new();
    let destroyed = Rc::new(Cell::new(0usize));
    let d = destroyed.clone();
    sut.set_destroy(Some(Box::new(move |_: Pair<Vec<u8>, i32>| {
        d.set(d.get() + 1)
    })))
    .unwrap();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i].clone();
                let before = destroyed.get();
                let replaced = model.insert(k.clone(), v).is_some();
                prop_assert_eq!(sut.put(Pair::new(k, v)), Ok(None));
                prop_assert_eq!(destroyed.get(), before + usize::from(replaced));
            }
            Op::Get(i) => {
                let k = &pool[i];
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.get(k), Ok(v)),
                    None => prop_assert_eq!(sut.get(k), Err(MapError::KeyNotFound)),
                }
                prop_assert_eq!(sut.find(k).is_ok(), sut.get(k).is_ok());
            }
            Op::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k).is_ok(), model.contains_key(k));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let before = destroyed.get();
                if model.remove(k).is_some() {
                    prop_assert_eq!(sut.remove(k), Ok(None));
                    prop_assert_eq!(destroyed.get(), before + 1);
                } else {
                    prop_assert_eq!(sut.remove(k), Err(MapError::KeyNotFound));
                    prop_assert_eq!(destroyed.get(), before);
                }
            }
            Op::Lookup(k) => {
                if k.is_empty() {
                    prop_assert_eq!(sut.find(&k), Err(MapError::InvalidKeySize));
                    prop_assert_eq!(sut.get(&k), Err(MapError::InvalidKeySize));
                    prop_assert_eq!(sut.remove(&k), Err(MapError::InvalidKeySize));
                    prop_assert_eq!(
                        sut.put(Pair::new(k, 0)),
                        Err(MapError::InvalidKeySize)
                    );
                } else {
                    prop_assert_eq!(sut.find(&k).is_ok(), model.contains_key(&k));
                }
            }
            Op::Enumerate => {
                let keys = drain_cursor(&mut sut)?;
                prop_assert_eq!(keys.len(), model.len(), "each pair yielded exactly once");
                let s_keys: BTreeSet<_> = keys.into_iter().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(&s_keys, &m_keys);

                let it_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(it_keys, m_keys);
            }
        }

        prop_assert_eq!(sut.size(), Ok(model.len()));
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(MapConfig::new(), pool, ops)?;
    }

    // Same invariants under worst-case collisions: every key in one chain.
    #[test]
    fn prop_state_machine_single_chain((pool, ops) in arb_scenario()) {
        let hash: HashFn = const_hash;
        run_state_machine(MapConfig::new().with_hash(hash), pool, ops)?;
    }

    // Same invariants with growth enabled and a load factor low enough that
    // small pools trigger rehashing.
    #[test]
    fn prop_state_machine_growing((pool, ops) in arb_scenario()) {
        let config = MapConfig::new()
            .with_hash(low_entropy_hash)
            .with_growth(GrowthPolicy::NextPrime { max_load_factor: 0.002 });
        run_state_machine(config, pool, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    // Two walks over an unchanged map yield the same order.
    #[test]
    fn prop_enumeration_is_deterministic(
        keys in proptest::collection::btree_set(proptest::collection::vec(any::<u8>(), 1..8), 0..40)
    ) {
        let mut sut: ChainHashMap<Vec<u8>, i32> = ChainHashMap::new().unwrap();
        for (i, k) in keys.iter().enumerate() {
            sut.put(Pair::new(k.clone(), i as i32)).unwrap();
        }
        let first = drain_cursor(&mut sut)?;
        let second = drain_cursor(&mut sut)?;
        prop_assert_eq!(&first, &second);
        let via_iter: Vec<Vec<u8>> = sut.iter().map(|(k, _)| k.clone()).collect();
        prop_assert_eq!(first, via_iter);
    }
}
