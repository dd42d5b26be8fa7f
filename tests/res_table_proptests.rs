// ResTable property tests through the public API.
//
// Property 1: string-keyed table equals a HashMap<String, key> model.
//  - Operations: add, remove, lookup by &str, lookup by referencing id.
//  - Invariant: lookup hits exactly the model's keys; len() and iter()
//    agree with the model; verify() passes after every step.
//
// Property 2: chronological ids stay unique under churn.
//  - Operations: add a fresh entry, remove an installed one by id.
//  - Invariant: installed ids are pairwise distinct and each resolves to its
//    own entry; without wraparound every new id exceeds all earlier ones.
use proptest::prelude::*;
use res_table::{
    ChronIntId, ChronIntIdResTable, ChronResource, ResTable, Resource, StringId, TableError,
    UNASSIGNED_CHRON_ID,
};
use slotmap::{DefaultKey, SlotMap};
use std::collections::{BTreeMap, HashMap};

struct Named(StringId<'static>);

impl Resource for Named {
    type Id = StringId<'static>;
    fn id(&self) -> &Self::Id {
        &self.0
    }
}

struct Ticket(ChronIntId);

impl Resource for Ticket {
    type Id = ChronIntId;
    fn id(&self) -> &ChronIntId {
        &self.0
    }
}

impl ChronResource for Ticket {
    fn set_id(&mut self, id: ChronIntId) {
        self.0 = id;
    }
}

// Names from a small alphabet so collisions and re-adds are common.
fn arb_name() -> impl Strategy<Value = String> {
    "[a-d]{1,3}"
}

// Property 1
proptest! {
    #[test]
    fn prop_string_table_matches_model(ops in proptest::collection::vec((0u8..4, arb_name()), 1..300)) {
        let mut arena: SlotMap<DefaultKey, Named> = SlotMap::new();
        let mut t: ResTable<StringId<'static>> = ResTable::new();
        let mut model: HashMap<String, DefaultKey> = HashMap::new();

        for (op, name) in ops {
            match op {
                0 | 1 => {
                    let k = arena.insert(Named(StringId::from(name.clone())));
                    match t.add(&arena, k) {
                        Ok(()) => { prop_assert!(model.insert(name, k).is_none()); }
                        Err(TableError::DuplicateKey) => {
                            prop_assert!(model.contains_key(&name));
                            arena.remove(k);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                2 => {
                    let got = t.remove(&arena, name.as_str());
                    prop_assert_eq!(got, model.remove(&name));
                    if let Some(k) = got { arena.remove(k); }
                }
                _ => {
                    let by_str = t.lookup(&arena, name.as_str());
                    let by_ref = t.lookup(&arena, &StringId::referenced(&name));
                    prop_assert_eq!(by_str, model.get(&name).copied());
                    prop_assert_eq!(by_ref, by_str);
                }
            }
            prop_assert_eq!(t.len(), model.len());
            prop_assert_eq!(t.iter().count(), model.len());
            prop_assert!(t.verify(&arena).is_ok());
        }
    }
}

// Property 2
proptest! {
    #[test]
    fn prop_chron_ids_unique(ops in proptest::collection::vec(any::<Option<prop::sample::Index>>(), 1..400)) {
        let mut arena: SlotMap<DefaultKey, Ticket> = SlotMap::new();
        let mut t: ChronIntIdResTable = ChronIntIdResTable::new();
        let mut installed: BTreeMap<u32, DefaultKey> = BTreeMap::new();
        let mut last = 0u32;

        for op in ops {
            match op {
                Some(ix) if !installed.is_empty() => {
                    let (&id, &k) = installed.iter().nth(ix.index(installed.len())).unwrap();
                    prop_assert_eq!(t.remove(&arena, &ChronIntId::new(id)), Some(k));
                    installed.remove(&id);
                    arena.remove(k);
                }
                _ => {
                    let k = arena.insert(Ticket(UNASSIGNED_CHRON_ID));
                    let id = t.add(&mut arena, k).unwrap().id();
                    prop_assert!(id > last);
                    prop_assert!(installed.insert(id, k).is_none());
                    last = id;
                }
            }
            prop_assert_eq!(t.len(), installed.len());
        }
        for (&id, &k) in &installed {
            prop_assert_eq!(t.lookup(&arena, &ChronIntId::new(id)), Some(k));
            prop_assert_eq!(arena[k].0.id(), id);
        }
        prop_assert!(t.verify(&arena).is_ok());
    }
}
