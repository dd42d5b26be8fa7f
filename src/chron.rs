//! Resource table that numbers its entries itself.
//!
//! Ids come from a counter that starts at 1 and increments on every
//! attempt. After the counter wraps, ids still held by long-lived entries
//! are skipped: a collision just moves on to the next id, so an id is
//! never handed out twice while its first holder is installed.

use crate::arena::{Arena, Resource};
use crate::error::TableError;
use crate::id::ChronIntId;
use crate::iter::{Entries, Iter};
use crate::res_table::{ResTable, Visit};
use crate::stats::{TableStats, VerifyError};
use slotmap::{DefaultKey, Key};

/// A resource whose id is assigned by a `ChronIntIdResTable`.
pub trait ChronResource: Resource<Id = ChronIntId> {
    fn set_id(&mut self, id: ChronIntId);
}

/// Number of distinct chronological ids.
const ID_SPACE: u64 = 1 << u32::BITS;

#[derive(Debug)]
pub struct ChronIntIdResTable<K = DefaultKey> {
    table: ResTable<ChronIntId, K>,
    alloc_id: u32,
}

impl<K: Key> Default for ChronIntIdResTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> ChronIntIdResTable<K> {
    pub fn new() -> Self {
        Self {
            table: ResTable::new(),
            alloc_id: 1,
        }
    }

    pub fn with_table_size(hint: usize) -> Result<Self, TableError> {
        Ok(Self {
            table: ResTable::with_table_size(hint)?,
            alloc_id: 1,
        })
    }

    /// Give the entry under `key` the next free id and install it.
    ///
    /// The id is written into the entry before each attempt, so on success
    /// the entry carries the returned id. Fails with `DuplicateKey` if this
    /// very entry is already installed, and with `IdSpaceExhausted` once all
    /// 2^32 ids are taken.
    pub fn add<A>(&mut self, arena: &mut A, key: K) -> Result<ChronIntId, TableError>
    where
        A: Arena<K>,
        A::Item: ChronResource,
    {
        let current = *arena.get(key).ok_or(TableError::StaleHandle)?.id();
        if self.table.lookup(&*arena, &current) == Some(key) {
            return Err(TableError::DuplicateKey);
        }
        if self.table.len() as u64 >= ID_SPACE {
            return Err(TableError::IdSpaceExhausted);
        }
        loop {
            let id = ChronIntId::new(self.alloc_id);
            self.alloc_id = self.alloc_id.wrapping_add(1);
            arena
                .get_mut(key)
                .ok_or(TableError::StaleHandle)?
                .set_id(id);
            match self.table.add(&*arena, key) {
                Ok(()) => return Ok(id),
                Err(TableError::DuplicateKey) => {
                    log::trace!("chronological id {id} still in use, trying the next one");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The id the next `add` will try first.
    pub fn next_id(&self) -> u32 {
        self.alloc_id
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, id: u32) {
        self.alloc_id = id;
    }

    /// The underlying table, for read-only use.
    pub fn as_table(&self) -> &ResTable<ChronIntId, K> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn lookup<A>(&self, arena: &A, id: &ChronIntId) -> Option<K>
    where
        A: Arena<K>,
        A::Item: ChronResource,
    {
        self.table.lookup(arena, id)
    }

    pub fn remove<A>(&mut self, arena: &A, id: &ChronIntId) -> Option<K>
    where
        A: Arena<K>,
        A::Item: ChronResource,
    {
        self.table.remove(arena, id)
    }

    pub fn traverse<A, F>(&mut self, arena: &mut A, action: F)
    where
        A: Arena<K>,
        F: FnMut(K, &mut A::Item) -> Visit,
    {
        self.table.traverse(arena, action)
    }

    pub fn traverse_const<A, F>(&self, arena: &A, action: F)
    where
        A: Arena<K>,
        F: FnMut(K, &A::Item),
    {
        self.table.traverse_const(arena, action)
    }

    pub fn iter(&self) -> Iter<'_, K> {
        self.table.iter()
    }

    pub fn entries<'a, A: Arena<K>>(&'a self, arena: &'a A) -> Entries<'a, A, K> {
        self.table.entries(arena)
    }

    pub fn set_table_size(&mut self, hint: usize) -> Result<(), TableError> {
        self.table.set_table_size(hint)
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    pub fn verify<A>(&self, arena: &A) -> Result<(), VerifyError>
    where
        A: Arena<K>,
        A::Item: ChronResource,
    {
        self.table.verify(arena)
    }

    pub fn show<A>(&self, arena: &A, level: u32)
    where
        A: Arena<K>,
        A::Item: ChronResource,
    {
        self.table.show(arena, level)
    }
}
