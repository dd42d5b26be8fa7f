//! Sequential walks over a table's addressed buckets.
//!
//! Both iterators borrow the table, so the borrow checker rules out any
//! mutation while a walk is in progress. Start over by asking the table
//! for a fresh iterator.

use crate::arena::Arena;
use crate::chain::{Chain, Link};
use core::iter::FusedIterator;
use core::slice;
use slotmap::Key;

/// Keys of installed entries, bucket by bucket.
pub struct Iter<'a, K> {
    buckets: slice::Iter<'a, Chain<K>>,
    chain: slice::Iter<'a, Link<K>>,
}

impl<'a, K: Copy> Iter<'a, K> {
    pub(crate) fn new(buckets: &'a [Chain<K>]) -> Self {
        let empty: &'a [Link<K>] = Default::default();
        Self {
            buckets: buckets.iter(),
            chain: empty.iter(),
        }
    }
}

impl<K: Copy> Iterator for Iter<'_, K> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        loop {
            if let Some(link) = self.chain.next() {
                return Some(link.key);
            }
            self.chain = self.buckets.next()?.iter();
        }
    }
}

impl<K: Copy> FusedIterator for Iter<'_, K> {}

/// Installed entries resolved through the arena. Keys that no longer
/// resolve are skipped.
pub struct Entries<'a, A, K> {
    keys: Iter<'a, K>,
    arena: &'a A,
}

impl<'a, A, K: Copy> Entries<'a, A, K> {
    pub(crate) fn new(keys: Iter<'a, K>, arena: &'a A) -> Self {
        Self { keys, arena }
    }
}

impl<'a, A, K> Iterator for Entries<'a, A, K>
where
    A: Arena<K>,
    A::Item: 'a,
    K: Key,
{
    type Item = (K, &'a A::Item);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.keys.find_map(|k| arena.get(k).map(|item| (k, item)))
    }
}

impl<'a, A, K> FusedIterator for Entries<'a, A, K>
where
    A: Arena<K>,
    A::Item: 'a,
    K: Key,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TableIndex;

    fn buckets(layout: &[&[u32]]) -> Vec<Chain<u32>> {
        layout
            .iter()
            .map(|keys| {
                let mut c = Chain::default();
                for &key in keys.iter() {
                    c.push(Link {
                        hash: key as TableIndex,
                        key,
                    });
                }
                c
            })
            .collect()
    }

    #[test]
    fn walks_buckets_in_order_skipping_empty_ones() {
        let b = buckets(&[&[], &[1, 2], &[], &[], &[3], &[]]);
        let keys: Vec<u32> = Iter::new(&b).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn empty_and_exhausted_iterators_stay_done() {
        let none: Vec<Chain<u32>> = Vec::new();
        let mut it = Iter::new(&none);
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);

        let b = buckets(&[&[7]]);
        let mut it = Iter::new(&b);
        assert_eq!(it.next(), Some(7));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn fresh_iterator_restarts() {
        let b = buckets(&[&[4], &[5, 6]]);
        let first: Vec<u32> = Iter::new(&b).collect();
        let second: Vec<u32> = Iter::new(&b).collect();
        assert_eq!(first, second);
    }
}
