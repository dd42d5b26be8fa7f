#![cfg(test)]

// Property tests for ResTable kept inside the crate so they can reach the
// test-only growth failure switch.

use crate::arena::Resource;
use crate::error::TableError;
use crate::id::{Identifier, IntId, TableIndex};
use crate::res_table::{ResTable, Visit};
use proptest::prelude::*;
use slotmap::{DefaultKey, SlotMap};
use std::collections::{BTreeSet, HashMap};

type Id = IntId<u32>;

#[derive(Debug)]
struct Rec {
    id: Id,
}

impl Resource for Rec {
    type Id = Id;
    fn id(&self) -> &Id {
        &self.id
    }
}

// Pool-indexed operations: ids are drawn from a small pool so duplicates and
// re-adds after removal come up often.
#[derive(Clone, Debug)]
enum Op {
    Add(usize),
    Remove(usize),
    Lookup(usize),
    RemoveMatching(u32),
    SetTableSize(usize),
    FailGrowth(bool),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::btree_set(any::<u32>(), 1..=64).prop_flat_map(|pool| {
        let pool: Vec<u32> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => idx.clone().prop_map(Op::Add),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Lookup),
            1 => (2u32..5).prop_map(Op::RemoveMatching),
            1 => (0usize..300).prop_map(Op::SetTableSize),
            1 => any::<bool>().prop_map(Op::FailGrowth),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// - add succeeds exactly when the id is absent, else DuplicateKey with no change.
// - lookup succeeds exactly between a successful add and the matching remove.
// - traversal with removal visits each entry once and removes what it asked for.
// - growth failures on a populated table never lose entries or fail an add.
// - verify() passes and len() matches the model after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut arena: SlotMap<DefaultKey, Rec> = SlotMap::new();
        let mut sut: ResTable<Id> = ResTable::new();
        let mut model: HashMap<u32, DefaultKey> = HashMap::new();
        let mut failing = false;

        for op in ops {
            match op {
                Op::Add(i) => {
                    let id = pool[i];
                    let k = arena.insert(Rec { id: Id::new(id) });
                    let cap = sut.capacity();
                    match sut.add(&arena, k) {
                        Ok(()) => {
                            prop_assert!(!model.contains_key(&id), "add must fail on duplicate");
                            model.insert(id, k);
                        }
                        Err(TableError::DuplicateKey) => {
                            prop_assert!(model.contains_key(&id));
                            prop_assert_eq!(sut.capacity(), cap, "rejected add must not split");
                            arena.remove(k);
                        }
                        Err(TableError::Alloc(_)) => {
                            prop_assert!(failing && cap == 0, "only the first allocation may fail");
                            arena.remove(k);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::Remove(i) => {
                    let id = pool[i];
                    let got = sut.remove(&arena, &Id::new(id));
                    prop_assert_eq!(got, model.remove(&id));
                    if let Some(k) = got {
                        arena.remove(k);
                    }
                }
                Op::Lookup(i) => {
                    let id = pool[i];
                    prop_assert_eq!(sut.lookup(&arena, &Id::new(id)), model.get(&id).copied());
                }
                Op::RemoveMatching(m) => {
                    let mut seen = BTreeSet::new();
                    let mut removed = Vec::new();
                    sut.traverse(&mut arena, |k, r| {
                        assert!(seen.insert(k), "entry visited twice");
                        if r.id.id() % m == 0 {
                            removed.push(k);
                            Visit::Remove
                        } else {
                            Visit::Keep
                        }
                    });
                    prop_assert_eq!(seen.len(), model.len());
                    for k in removed {
                        let id = arena.remove(k).expect("arena entry").id.id();
                        prop_assert_eq!(model.remove(&id), Some(k));
                    }
                }
                Op::SetTableSize(n) => {
                    let allocated = sut.allocated_buckets();
                    match sut.set_table_size(n) {
                        Ok(()) => prop_assert!(sut.allocated_buckets() >= allocated),
                        Err(TableError::Alloc(_)) => prop_assert!(failing && allocated == 0),
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::FailGrowth(f) => {
                    failing = f;
                    sut.set_fail_growth(f);
                }
                Op::Iterate => {
                    let keys: BTreeSet<DefaultKey> = sut.iter().collect();
                    let expected: BTreeSet<DefaultKey> = model.values().copied().collect();
                    prop_assert_eq!(keys, expected);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.iter().count(), model.len());
            prop_assert!(sut.verify(&arena).is_ok(), "verify failed: {:?}", sut.verify(&arena));
        }
    }
}

// Identifier with a deliberately weak hash: only the low 3 bits of the id
// matter, so chains get long and splits move little.
#[derive(Debug, PartialEq)]
struct Weak(u32);

impl Identifier for Weak {
    fn hash_index(&self) -> TableIndex {
        (self.0 & 7) as TableIndex
    }
}

struct WeakRec(Weak);

impl Resource for WeakRec {
    type Id = Weak;
    fn id(&self) -> &Weak {
        &self.0
    }
}

// Property: the same add/remove/lookup equivalence holds when most entries
// collide, and the split machinery still keeps every entry reachable.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_weak_hash_equivalence(ops in proptest::collection::vec((any::<bool>(), 0u32..64), 1..300)) {
        let mut arena: SlotMap<DefaultKey, WeakRec> = SlotMap::new();
        let mut sut: ResTable<Weak> = ResTable::with_table_size(16).unwrap();
        let mut model: HashMap<u32, DefaultKey> = HashMap::new();

        for (add, id) in ops {
            if add {
                let k = arena.insert(WeakRec(Weak(id)));
                match sut.add(&arena, k) {
                    Ok(()) => { prop_assert!(model.insert(id, k).is_none()); }
                    Err(TableError::DuplicateKey) => {
                        prop_assert!(model.contains_key(&id));
                        arena.remove(k);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            } else {
                let got = sut.remove(&arena, &Weak(id));
                prop_assert_eq!(got, model.remove(&id));
                if let Some(k) = got { arena.remove(k); }
            }
            prop_assert!(sut.verify(&arena).is_ok());
        }
        for (&id, &k) in &model {
            prop_assert_eq!(sut.lookup(&arena, &Weak(id)), Some(k));
        }
        prop_assert_eq!(sut.len(), model.len());
    }
}
