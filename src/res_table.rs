//! ResTable: bucket array with incremental (linear hashing) growth.
//!
//! Addressing: `hash & half_mask` picks a bucket from the pre-split region.
//! Buckets below `next_split_index` have already been split this generation,
//! so for those the next hash bit (`hash & split_mask`) decides between the
//! bucket and its sibling `bucket + half_mask + 1`.
//!
//! Growth: once the table holds as many entries as it has buckets, each
//! `add` splits exactly one bucket. When every bucket of the generation has
//! been split the masks widen by one bit and `next_split_index` restarts at
//! zero; storage doubles first if needed. Doubling only moves chains, it
//! never rehashes, so an `add` costs at most one chain's worth of extra work.

use crate::arena::{Arena, Resource};
use crate::chain::{Chain, Link};
use crate::error::TableError;
use crate::guard::NestingGuard;
use crate::id::{Identifier, TableIndex};
use crate::iter::{Entries, Iter};
use crate::stats::{TableStats, VerifyError};
use core::marker::PhantomData;
use slotmap::{DefaultKey, Key};

/// log2 of the storage allocated by the first `add` when no size was set.
pub const DEFAULT_LOG_TABLE_SIZE: u32 = 10;
/// log2 of the smallest storage a table allocates.
pub const MIN_LOG_TABLE_SIZE: u32 = 4;

/// What `ResTable::traverse` does with the entry it just visited.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visit {
    Keep,
    /// Unlink the visited entry from the table. The entry itself stays in
    /// the arena.
    Remove,
}

#[inline]
fn bit_mask(bits: u32) -> usize {
    1usize.checked_shl(bits).map_or(usize::MAX, |b| b - 1)
}

#[inline]
fn address(hash: TableIndex, half_mask: usize, split_mask: usize, next_split: usize) -> usize {
    let h0 = hash & half_mask;
    if h0 >= next_split {
        h0
    } else {
        hash & split_mask
    }
}

/// Hash table of arena keys, looked up by identifier.
///
/// The table owns only its bucket array. Entries stay in the caller's
/// arena; every method that compares identifiers borrows that arena. An
/// entry must be removed from the table before it is removed from the arena.
#[derive(Debug)]
pub struct ResTable<ID, K = DefaultKey> {
    buckets: Vec<Chain<K>>,
    next_split_index: usize,
    hash_ix_mask: usize,
    hash_ix_split_mask: usize,
    split_bits: u32,
    log_table_size: u32,
    len: usize,
    guard: NestingGuard,
    #[cfg(test)]
    fail_growth: bool,
    _id: PhantomData<fn() -> ID>,
}

impl<ID: Identifier, K: Key> Default for ResTable<ID, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ID: Identifier, K: Key> ResTable<ID, K> {
    /// Empty table. Storage is allocated by the first `add`.
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            next_split_index: 0,
            hash_ix_mask: 0,
            hash_ix_split_mask: 0,
            split_bits: 0,
            log_table_size: 0,
            len: 0,
            guard: NestingGuard::new(),
            #[cfg(test)]
            fail_growth: false,
            _id: PhantomData,
        }
    }

    /// Table with storage for `hint` buckets (see `set_table_size`).
    pub fn with_table_size(hint: usize) -> Result<Self, TableError> {
        let mut table = Self::new();
        table.set_table_size(hint)?;
        Ok(table)
    }

    /// Number of installed entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buckets currently addressed. Only grows.
    pub fn capacity(&self) -> usize {
        if self.buckets.is_empty() {
            0
        } else {
            self.hash_ix_mask + 1 + self.next_split_index
        }
    }

    /// Buckets of backing storage, addressed or not.
    pub fn allocated_buckets(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, hash: TableIndex) -> usize {
        address(
            hash,
            self.hash_ix_mask,
            self.hash_ix_split_mask,
            self.next_split_index,
        )
    }

    /// Position of the entry equal to `id` inside bucket `ix`.
    fn position<A, Q>(&self, arena: &A, ix: usize, hash: TableIndex, id: &Q) -> Option<usize>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
        ID: PartialEq<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        self.buckets[ix].position(|link| {
            link.hash == hash && arena.get(link.key).is_some_and(|item| item.id() == id)
        })
    }

    /// Install the entry stored under `key`.
    ///
    /// Fails with `DuplicateKey` (and changes nothing) when an entry with an
    /// equal identifier is already installed. The only other failure is an
    /// allocation failure while the table has no storage yet; growth
    /// failures on a populated table are logged and the entry goes in anyway.
    pub fn add<A>(&mut self, arena: &A, key: K) -> Result<(), TableError>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
    {
        let id = arena.get(key).ok_or(TableError::StaleHandle)?.id();
        let hash = id.hash_index();
        if self.buckets.is_empty() {
            self.grow(DEFAULT_LOG_TABLE_SIZE)?;
        } else {
            if self.position(arena, self.bucket_of(hash), hash, id).is_some() {
                return Err(TableError::DuplicateKey);
            }
            if self.len >= self.capacity() {
                self.split_bucket();
            }
        }
        let ix = self.bucket_of(hash);
        debug_assert!(self.position(arena, ix, hash, id).is_none());
        self.buckets[ix].push(Link { hash, key });
        self.len += 1;
        Ok(())
    }

    /// Unlink the entry whose identifier equals `id` and return its key.
    ///
    /// Only the bucket `id` addresses is scanned. Capacity never shrinks.
    pub fn remove<A, Q>(&mut self, arena: &A, id: &Q) -> Option<K>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
        ID: PartialEq<Q>,
        Q: Identifier + ?Sized,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let hash = id.hash_index();
        let ix = self.bucket_of(hash);
        let pos = self.position(arena, ix, hash, id)?;
        let link = self.buckets[ix].swap_remove(pos);
        self.len -= 1;
        Some(link.key)
    }

    /// Key of the entry whose identifier equals `id`.
    pub fn lookup<A, Q>(&self, arena: &A, id: &Q) -> Option<K>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
        ID: PartialEq<Q>,
        Q: Identifier + ?Sized,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let hash = id.hash_index();
        let ix = self.bucket_of(hash);
        let pos = self.position(arena, ix, hash, id)?;
        self.buckets[ix].get(pos).map(|link| link.key)
    }

    /// Like `lookup`, resolved through the arena.
    pub fn get<'a, A, Q>(&self, arena: &'a A, id: &Q) -> Option<&'a A::Item>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
        ID: PartialEq<Q>,
        Q: Identifier + ?Sized,
    {
        self.lookup(arena, id).and_then(|k| arena.get(k))
    }

    /// Call `action` once for every installed entry.
    ///
    /// Returning `Visit::Remove` unlinks the entry just visited; the walk
    /// has already moved past it, so no other entry is skipped or visited
    /// twice. The callback cannot reach the table, so no other structural
    /// change is possible during the walk. Keys that no longer resolve in
    /// the arena are skipped.
    pub fn traverse<A, F>(&mut self, arena: &mut A, mut action: F)
    where
        A: Arena<K>,
        F: FnMut(K, &mut A::Item) -> Visit,
    {
        for ix in 0..self.capacity() {
            // Walk backwards: a swap-removal only pulls in an entry that has
            // already been visited.
            let mut pos = self.buckets[ix].len();
            while pos > 0 {
                pos -= 1;
                let Some(link) = self.buckets[ix].get(pos) else {
                    continue;
                };
                let Some(item) = arena.get_mut(link.key) else {
                    continue;
                };
                if action(link.key, item) == Visit::Remove {
                    self.buckets[ix].swap_remove(pos);
                    self.len -= 1;
                }
            }
        }
    }

    /// Read-only `traverse`.
    pub fn traverse_const<A, F>(&self, arena: &A, mut action: F)
    where
        A: Arena<K>,
        F: FnMut(K, &A::Item),
    {
        for (key, item) in self.entries(arena) {
            action(key, item);
        }
    }

    /// Keys of all installed entries in bucket order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(&self.buckets[..self.capacity()])
    }

    /// Installed entries with their keys, in bucket order.
    pub fn entries<'a, A>(&'a self, arena: &'a A) -> Entries<'a, A, K>
    where
        A: Arena<K>,
    {
        Entries::new(self.iter(), arena)
    }

    /// Round `hint` up to a power of two (at least `2^MIN_LOG_TABLE_SIZE`)
    /// and make sure that much storage exists.
    ///
    /// Never shrinks. On an empty table this also fixes the starting split
    /// masks, which makes it cheapest to call before the first `add`. On a
    /// populated table a failed allocation is logged and ignored.
    pub fn set_table_size(&mut self, hint: usize) -> Result<(), TableError> {
        if hint == 0 {
            return Ok(());
        }
        let log2 = usize::BITS - (hint - 1).leading_zeros();
        match self.grow(log2) {
            Err(err) if !self.buckets.is_empty() => {
                log::warn!(
                    "resource table keeps {} buckets of storage, resize failed: {err}",
                    self.buckets.len()
                );
                Ok(())
            }
            res => res,
        }
    }

    /// Replace storage with `2^log2` buckets, moving every chain across.
    ///
    /// The new storage is fully reserved before anything moves, so a
    /// failure leaves the table exactly as it was.
    fn grow(&mut self, log2: u32) -> Result<(), TableError> {
        let log2 = log2.max(MIN_LOG_TABLE_SIZE);
        if self.log_table_size >= log2 {
            return Ok(());
        }
        let size = 1usize
            .checked_shl(log2)
            .ok_or(TableError::CapacityOverflow { log2 })?;

        let mut storage: Vec<Chain<K>> = Vec::new();
        #[cfg(test)]
        if self.fail_growth {
            storage.try_reserve_exact(usize::MAX)?;
        }
        storage.try_reserve_exact(size)?;
        storage.extend(self.buckets.iter_mut().map(core::mem::take));
        storage.resize_with(size, Chain::default);

        let first = self.buckets.is_empty();
        self.buckets = storage;
        self.log_table_size = log2;
        if first {
            self.split_bits = log2;
            self.hash_ix_split_mask = bit_mask(log2);
            self.hash_ix_mask = self.hash_ix_split_mask >> 1;
            self.next_split_index = 0;
        }
        log::debug!("resource table storage grew to {size} buckets");
        Ok(())
    }

    /// Split the next bucket of the current generation.
    fn split_bucket(&mut self) {
        if self.next_split_index > self.hash_ix_mask {
            if let Err(err) = self.grow(self.split_bits + 1) {
                log::warn!(
                    "resource table stays at {} buckets, growth failed: {err}",
                    self.capacity()
                );
                return;
            }
            self.split_bits += 1;
            self.hash_ix_split_mask = bit_mask(self.split_bits);
            self.hash_ix_mask = self.hash_ix_split_mask >> 1;
            self.next_split_index = 0;
            log::debug!(
                "resource table starts splitting toward {} buckets",
                self.hash_ix_split_mask.wrapping_add(1)
            );
        }

        let from = self.next_split_index;
        let sibling = from + self.hash_ix_mask + 1;
        self.next_split_index += 1;

        let (half, full, next) = (
            self.hash_ix_mask,
            self.hash_ix_split_mask,
            self.next_split_index,
        );
        let moved = self.buckets[from].split_off_where(|hash| address(hash, half, full, next) == from);
        log::trace!(
            "split bucket {from}: {} entries stay, {} move to {sibling}",
            self.buckets[from].len(),
            moved.len()
        );
        self.buckets[sibling].append(moved);
    }

    /// Occupancy statistics over the addressed buckets.
    pub fn stats(&self) -> TableStats {
        let cap = self.capacity();
        TableStats::from_chain_lengths(
            self.buckets[..cap].iter().map(Chain::len),
            cap,
            self.buckets.len(),
            self.len,
        )
    }

    /// Self-check: split state, placement of every entry, uniqueness of
    /// identifiers, and the installed count.
    pub fn verify<A>(&self, arena: &A) -> Result<(), VerifyError>
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
    {
        let _g = self.guard.enter();
        self.verify_split_state()?;

        let cap = self.capacity();
        let mut counted = 0usize;
        for (ix, chain) in self.buckets.iter().enumerate() {
            if ix >= cap {
                if !chain.is_empty() {
                    return Err(VerifyError::UnaddressedBucket { bucket: ix });
                }
                continue;
            }
            for (pos, link) in chain.iter().enumerate() {
                let item = arena
                    .get(link.key)
                    .ok_or(VerifyError::StaleKey { bucket: ix })?;
                if item.id().hash_index() != link.hash {
                    return Err(VerifyError::HashChanged { bucket: ix });
                }
                let expected = self.bucket_of(link.hash);
                if expected != ix {
                    return Err(VerifyError::Misplaced {
                        bucket: ix,
                        expected,
                        hash: link.hash,
                    });
                }
                let clash = chain.iter().skip(pos + 1).any(|other| {
                    other.hash == link.hash
                        && arena.get(other.key).is_some_and(|o| o.id() == item.id())
                });
                if clash {
                    return Err(VerifyError::DuplicateId { bucket: ix });
                }
            }
            counted += chain.len();
        }
        if counted != self.len {
            return Err(VerifyError::CountMismatch {
                counted,
                installed: self.len,
            });
        }
        Ok(())
    }

    fn verify_split_state(&self) -> Result<(), VerifyError> {
        use VerifyError::SplitState;
        if self.buckets.is_empty() {
            let untouched = self.next_split_index == 0
                && self.hash_ix_mask == 0
                && self.hash_ix_split_mask == 0
                && self.split_bits == 0
                && self.log_table_size == 0;
            return if untouched {
                Ok(())
            } else {
                Err(SplitState("table without storage carries split state"))
            };
        }
        if self.next_split_index > self.hash_ix_mask + 1 {
            return Err(SplitState("next split index beyond the generation"));
        }
        if self.hash_ix_mask == 0 || self.hash_ix_mask != self.hash_ix_split_mask >> 1 {
            return Err(SplitState("half mask is not the split mask shifted down"));
        }
        if bit_mask(self.split_bits) != self.hash_ix_split_mask {
            return Err(SplitState("split mask does not match the split bit count"));
        }
        if self.split_bits > self.log_table_size {
            return Err(SplitState("split mask addresses more than the storage"));
        }
        if Some(self.buckets.len()) != 1usize.checked_shl(self.log_table_size) {
            return Err(SplitState("storage length is not 2^log_table_size"));
        }
        Ok(())
    }

    /// Log a description of the table. Each entry's `Resource::show` is
    /// called with `level`; from level 1 the occupancy statistics follow.
    pub fn show<A>(&self, arena: &A, level: u32)
    where
        A: Arena<K>,
        A::Item: Resource<Id = ID>,
    {
        let stats = self.stats();
        log::info!(
            "{} bucket hash table with {} items of type {} installed",
            stats.buckets,
            self.len,
            core::any::type_name::<A::Item>()
        );
        for (_, item) in self.entries(arena) {
            item.show(level);
        }
        if level >= 1 {
            log::info!("{stats}");
            if !stats.is_consistent() {
                log::warn!(
                    "installed count {} does not match the {} entries found in chains",
                    stats.entries,
                    stats.counted
                );
            }
        }
    }

    /// Make every later growth attempt fail until switched off again.
    #[cfg(test)]
    pub(crate) fn set_fail_growth(&mut self, fail: bool) {
        self.fail_growth = fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IntId;
    use crate::string_id::StringId;
    use slotmap::SlotMap;
    use std::collections::BTreeSet;

    type Id = IntId<u32>;

    #[derive(Debug)]
    struct Rec {
        id: IntId<u32>,
        value: i32,
    }

    impl Resource for Rec {
        type Id = IntId<u32>;
        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    struct Named {
        name: StringId<'static>,
    }

    impl Resource for Named {
        type Id = StringId<'static>;
        fn id(&self) -> &Self::Id {
            &self.name
        }
    }

    fn rec(id: u32) -> Rec {
        Rec {
            id: IntId::new(id),
            value: id as i32,
        }
    }

    fn fill(
        table: &mut ResTable<IntId<u32>>,
        arena: &mut SlotMap<DefaultKey, Rec>,
        ids: impl IntoIterator<Item = u32>,
    ) -> Vec<DefaultKey> {
        ids.into_iter()
            .map(|i| {
                let k = arena.insert(rec(i));
                table.add(&*arena, k).unwrap();
                k
            })
            .collect()
    }

    fn key_set(table: &ResTable<IntId<u32>>) -> BTreeSet<DefaultKey> {
        table.iter().collect()
    }

    /// Three named entries, one lookup hit, one miss, one removal.
    #[test]
    fn string_scenario() {
        let mut arena: SlotMap<DefaultKey, Named> = SlotMap::new();
        let mut t: ResTable<StringId<'static>> = ResTable::new();
        for name in ["A", "B", "C"] {
            let k = arena.insert(Named {
                name: StringId::copied(name),
            });
            t.add(&arena, k).unwrap();
        }
        assert_eq!(t.len(), 3);
        assert!(t.lookup(&arena, "B").is_some());
        assert!(t.lookup(&arena, "D").is_none());

        let a = t.remove(&arena, &StringId::referenced("A")).expect("A installed");
        assert_eq!(arena[a].name.resource_name(), Some("A"));
        assert!(t.lookup(&arena, "A").is_none());
        assert_eq!(t.len(), 2);
        t.verify(&arena).unwrap();
    }

    #[test]
    fn duplicate_add_changes_nothing() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        let keys = fill(&mut t, &mut arena, 0..40);
        let before = key_set(&t);
        let (cap, allocated) = (t.capacity(), t.allocated_buckets());

        let dup = arena.insert(rec(17));
        match t.add(&arena, dup) {
            Err(TableError::DuplicateKey) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.len(), 40);
        assert_eq!(key_set(&t), before);
        assert_eq!((t.capacity(), t.allocated_buckets()), (cap, allocated));
        assert_eq!(t.lookup(&arena, &Id::new(17)), Some(keys[17]));
        // Re-adding the very same key is a duplicate as well.
        assert!(matches!(t.add(&arena, keys[3]), Err(TableError::DuplicateKey)));
    }

    #[test]
    fn stale_key_is_rejected() {
        let mut arena = SlotMap::new();
        let mut t: ResTable<IntId<u32>> = ResTable::new();
        let k = arena.insert(rec(1));
        arena.remove(k);
        assert!(matches!(t.add(&arena, k), Err(TableError::StaleHandle)));
        assert!(t.is_empty());
        assert_eq!(t.allocated_buckets(), 0);
    }

    #[test]
    fn first_add_allocates_default_storage() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        assert_eq!(t.capacity(), 0);
        fill(&mut t, &mut arena, [5]);
        assert_eq!(t.allocated_buckets(), 1 << DEFAULT_LOG_TABLE_SIZE);
        assert_eq!(t.capacity(), 1 << (DEFAULT_LOG_TABLE_SIZE - 1));
        t.verify(&arena).unwrap();
    }

    /// Past full load every add splits exactly one bucket.
    #[test]
    fn capacity_tracks_load_one_split_at_a_time() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(16).unwrap();
        assert_eq!(t.capacity(), 8);
        for i in 0..200u32 {
            let cap = t.capacity();
            let len = t.len();
            fill(&mut t, &mut arena, [i]);
            if len >= cap {
                assert_eq!(t.capacity(), cap + 1, "one split per add past full load");
            } else {
                assert_eq!(t.capacity(), cap);
            }
            t.verify(&arena).unwrap();
        }
        assert!(t.capacity() >= t.len());
        assert_eq!(t.allocated_buckets(), 256);
    }

    #[test]
    fn growth_preserves_entries() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(16).unwrap();
        fill(&mut t, &mut arena, 0..16);
        let allocated = t.allocated_buckets();
        let mut expected = key_set(&t);
        // Keep adding until storage doubles, checking the set each time.
        let mut next = 16u32;
        while t.allocated_buckets() == allocated {
            let k = fill(&mut t, &mut arena, [next])[0];
            expected.insert(k);
            assert_eq!(key_set(&t), expected);
            next += 1;
        }
        assert_eq!(t.allocated_buckets(), allocated * 2);
        assert_eq!(t.iter().count(), t.len());
        t.verify(&arena).unwrap();
        for i in 0..next {
            assert!(t.lookup(&arena, &Id::new(i)).is_some(), "lost id {i}");
        }
    }

    #[test]
    fn set_table_size_rounds_and_never_shrinks() {
        let mut t: ResTable<IntId<u32>> = ResTable::new();
        t.set_table_size(0).unwrap();
        assert_eq!(t.allocated_buckets(), 0);
        t.set_table_size(1).unwrap();
        assert_eq!(t.allocated_buckets(), 16, "minimum storage");
        t.set_table_size(3).unwrap();
        assert_eq!(t.allocated_buckets(), 16);
        t.set_table_size(100).unwrap();
        assert_eq!(t.allocated_buckets(), 128);
        t.set_table_size(64).unwrap();
        assert_eq!(t.allocated_buckets(), 128);

        let fresh: ResTable<IntId<u32>> = ResTable::with_table_size(100).unwrap();
        assert_eq!(fresh.allocated_buckets(), 128);
        assert_eq!(fresh.capacity(), 64);
    }

    #[test]
    fn set_table_size_on_populated_table_keeps_addressing() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(16).unwrap();
        fill(&mut t, &mut arena, 0..12);
        let cap = t.capacity();
        t.set_table_size(1000).unwrap();
        assert_eq!(t.allocated_buckets(), 1024);
        assert_eq!(t.capacity(), cap);
        t.verify(&arena).unwrap();
        fill(&mut t, &mut arena, 12..300);
        t.verify(&arena).unwrap();
        assert_eq!(t.allocated_buckets(), 1024);
    }

    #[test]
    fn failed_growth_on_populated_table_is_absorbed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(16).unwrap();
        fill(&mut t, &mut arena, 0..16);
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.allocated_buckets(), 16);

        t.set_fail_growth(true);
        fill(&mut t, &mut arena, 16..20);
        assert_eq!(t.len(), 20);
        assert_eq!(t.capacity(), 16, "no split without storage");
        assert_eq!(t.allocated_buckets(), 16);
        t.set_table_size(4096).unwrap();
        assert_eq!(t.allocated_buckets(), 16);
        t.verify(&arena).unwrap();

        t.set_fail_growth(false);
        fill(&mut t, &mut arena, [20]);
        assert_eq!(t.allocated_buckets(), 32);
        assert_eq!(t.capacity(), 17);
        t.verify(&arena).unwrap();
        for i in 0..21 {
            assert!(t.lookup(&arena, &Id::new(i)).is_some());
        }
    }

    #[test]
    fn failed_first_allocation_propagates() {
        let mut arena = SlotMap::new();
        let mut t: ResTable<IntId<u32>> = ResTable::new();
        t.set_fail_growth(true);
        let k = arena.insert(rec(1));
        assert!(matches!(t.add(&arena, k), Err(TableError::Alloc(_))));
        assert!(matches!(t.set_table_size(64), Err(TableError::Alloc(_))));
        assert!(t.is_empty());
        assert_eq!(t.allocated_buckets(), 0);
        t.verify(&arena).unwrap();

        t.set_fail_growth(false);
        t.add(&arena, k).unwrap();
        assert_eq!(t.lookup(&arena, &Id::new(1)), Some(k));
    }

    #[test]
    fn traverse_can_remove_the_visited_entry() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(16).unwrap();
        fill(&mut t, &mut arena, 0..100);
        let mut visited = BTreeSet::new();
        t.traverse(&mut arena, |k, r: &mut Rec| {
            assert!(visited.insert(k), "visited twice");
            r.value += 1000;
            if r.id.id() % 2 == 0 {
                Visit::Remove
            } else {
                Visit::Keep
            }
        });
        assert_eq!(visited.len(), 100);
        assert_eq!(t.len(), 50);
        t.verify(&arena).unwrap();
        for i in 0..100u32 {
            let found = t.get(&arena, &Id::new(i));
            assert_eq!(found.is_some(), i % 2 == 1);
            if let Some(r) = found {
                assert_eq!(r.value, i as i32 + 1000);
            }
        }
        // Removed entries stay in the arena.
        assert_eq!(arena.len(), 100);
    }

    #[test]
    fn traverse_removing_everything_empties_table() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        fill(&mut t, &mut arena, 0..64);
        t.traverse(&mut arena, |_, _| Visit::Remove);
        assert!(t.is_empty());
        assert_eq!(t.iter().next(), None);
        t.verify(&arena).unwrap();
    }

    #[test]
    fn traverse_const_sees_every_entry() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        fill(&mut t, &mut arena, 0..30);
        let mut sum = 0;
        t.traverse_const(&arena, |_, r| sum += r.value);
        assert_eq!(sum, (0..30).sum::<i32>());
    }

    #[test]
    fn collisions_resolve_by_equality() {
        #[derive(PartialEq)]
        struct Clash(u32);
        impl Identifier for Clash {
            fn hash_index(&self) -> TableIndex {
                0
            }
        }
        struct C(Clash);
        impl Resource for C {
            type Id = Clash;
            fn id(&self) -> &Clash {
                &self.0
            }
        }

        let mut arena = SlotMap::new();
        let mut t: ResTable<Clash> = ResTable::new();
        let keys: Vec<_> = (0..50)
            .map(|i| {
                let k = arena.insert(C(Clash(i)));
                t.add(&arena, k).unwrap();
                k
            })
            .collect();
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.lookup(&arena, &Clash(i as u32)), Some(*k));
        }
        assert_eq!(t.stats().max_chain, 50);
        t.verify(&arena).unwrap();
        assert_eq!(t.remove(&arena, &Clash(7)), Some(keys[7]));
        assert_eq!(t.remove(&arena, &Clash(7)), None);
    }

    #[test]
    fn verify_reports_changed_identifier() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        let keys = fill(&mut t, &mut arena, 0..10);
        arena[keys[4]].id = IntId::new(0xdead_beef);
        assert!(matches!(
            t.verify(&arena),
            Err(VerifyError::HashChanged { .. })
        ));
    }

    #[test]
    fn verify_reports_stale_key() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::new();
        let keys = fill(&mut t, &mut arena, 0..10);
        arena.remove(keys[2]);
        assert!(matches!(t.verify(&arena), Err(VerifyError::StaleKey { .. })));
        assert_eq!(t.iter().count(), 10);
        assert_eq!(t.entries(&arena).count(), 9);
    }

    #[test]
    fn stats_follow_contents() {
        let mut arena = SlotMap::new();
        let mut t = ResTable::with_table_size(64).unwrap();
        assert_eq!(t.stats().entries, 0);
        fill(&mut t, &mut arena, 0..32);
        let s = t.stats();
        assert_eq!(s.buckets, 32);
        assert_eq!(s.allocated, 64);
        assert_eq!(s.entries, 32);
        assert_eq!(s.counted, 32);
        assert!((s.mean - 1.0).abs() < 1e-12);
        assert!(s.max_chain >= 1);
        t.show(&arena, 3);
    }

    #[test]
    fn empty_table_operations() {
        let arena: SlotMap<DefaultKey, Rec> = SlotMap::new();
        let mut t: ResTable<IntId<u32>> = ResTable::default();
        assert!(t.lookup(&arena, &Id::new(1)).is_none());
        assert!(t.remove(&arena, &Id::new(1)).is_none());
        assert_eq!(t.iter().count(), 0);
        assert_eq!(t.stats(), TableStats::default());
        t.verify(&arena).unwrap();
    }
}
