#![cfg(test)]

// Property tests for ProbedTable kept inside the crate so they can reach the
// internal consistency check.

use crate::error::TableError;
use crate::probed_table::ProbedTable;
use proptest::prelude::*;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i64),
    Remove(usize),
    Get(usize),
    Contains(String),
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,5}", 1..=10)).prop_flat_map(|(cap, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            3 => (idx.clone(), any::<i64>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Get),
            1 => "[a-z]{0,5}".prop_map(OpI::Contains),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (cap, pool.clone(), ops))
    })
}

/// Reference model: a std map for contents plus a vector for recency,
/// earliest first.
#[derive(Default)]
struct Model {
    values: HashMap<String, i64>,
    order: Vec<String>,
}

impl Model {
    fn touch(&mut self, k: &str) {
        self.order.retain(|o| o != k);
        self.order.push(k.to_string());
    }

    fn remove(&mut self, k: &str) -> Option<i64> {
        self.order.retain(|o| o != k);
        self.values.remove(k)
    }
}

fn run_scenario<S: BuildHasher>(
    mut sut: ProbedTable<String, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let cap = sut.capacity();
    let mut model = Model::default();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = &pool[i];
                let present = model.values.contains_key(k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(present || model.values.len() < cap);
                        model.values.insert(k.clone(), v);
                        model.touch(k);
                    }
                    Err(TableError::CapacityExhausted { capacity }) => {
                        prop_assert_eq!(capacity, cap);
                        prop_assert!(!present, "existing key must always be updatable");
                        prop_assert_eq!(model.values.len(), cap, "only a full table rejects");
                    }
                    Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k.as_str()), model.remove(k));
                prop_assert_eq!(sut.get(k.as_str()), None);
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k.as_str()), model.values.get(k).copied());
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.values.contains_key(&s));
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.values.len());
        prop_assert_eq!(sut.earliest(), model.order.first());
        prop_assert_eq!(sut.latest(), model.order.last());
        let walked: Vec<String> = sut.iter().map(|(k, _)| k.clone()).collect();
        prop_assert_eq!(&walked, &model.order);
        prop_assert!(sut.len() + sut.tombstones() <= cap);
    }
    Ok(())
}

// Property: State-machine equivalence against a HashMap + recency vector.
// Invariants exercised across random operation sequences:
// - `get` returns the value of the latest insert; removed keys read as absent.
// - Only a completely full table rejects a new key; present keys always update.
// - `earliest`/`latest`/`iter` follow touch order over present keys.
// - Slots, arena and recency list stay consistent after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((cap, pool, ops) in arb_scenario()) {
        let sut: ProbedTable<String> = ProbedTable::new(cap).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one probe
// sequence, so removals leave tombstones in the middle of live chains.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((cap, pool, ops) in arb_scenario()) {
        let sut = ProbedTable::with_hasher(cap, ConstBuildHasher).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
