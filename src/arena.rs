//! Caller-owned entry storage.
//!
//! A table never holds entries. Entries live in a slotmap owned by the
//! caller and the table chains their keys. Any operation that has to look
//! at an identifier borrows the arena for the duration of the call.

use crate::id::Identifier;
use slotmap::{DenseSlotMap, HopSlotMap, Key, SlotMap};

/// A record that can be indexed by a resource table.
pub trait Resource {
    type Id: Identifier;

    /// The identifier this record is indexed under. It must not change
    /// while the record is installed in a table.
    fn id(&self) -> &Self::Id;

    /// Per-entry diagnostics, called from `ResTable::show` with the same
    /// level. Higher levels mean more detail.
    fn show(&self, _level: u32) {}
}

/// Keyed storage the table resolves its handles against.
pub trait Arena<K: Key> {
    type Item;

    fn get(&self, key: K) -> Option<&Self::Item>;
    fn get_mut(&mut self, key: K) -> Option<&mut Self::Item>;
}

macro_rules! impl_arena {
    ($($map:ident),* $(,)?) => {
        $(
            impl<K: Key, V> Arena<K> for $map<K, V> {
                type Item = V;

                #[inline]
                fn get(&self, key: K) -> Option<&V> {
                    $map::get(self, key)
                }

                #[inline]
                fn get_mut(&mut self, key: K) -> Option<&mut V> {
                    $map::get_mut(self, key)
                }
            }
        )*
    };
}

impl_arena!(SlotMap, HopSlotMap, DenseSlotMap);
