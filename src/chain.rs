//! Bucket chain: the keys that currently share one bucket index.

use crate::id::TableIndex;

/// One resident entry as seen by its bucket: the arena key plus the raw
/// identifier hash captured when it was added.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Link<K> {
    pub(crate) hash: TableIndex,
    pub(crate) key: K,
}

/// Unordered sequence of links. Removal swaps the last link into the hole,
/// so positions are only stable until the next removal.
#[derive(Clone, Debug)]
pub(crate) struct Chain<K> {
    links: Vec<Link<K>>,
}

impl<K> Default for Chain<K> {
    fn default() -> Self {
        Self { links: Vec::new() }
    }
}

impl<K: Copy> Chain<K> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[inline]
    pub(crate) fn push(&mut self, link: Link<K>) {
        self.links.push(link);
    }

    #[inline]
    pub(crate) fn get(&self, pos: usize) -> Option<Link<K>> {
        self.links.get(pos).copied()
    }

    #[inline]
    pub(crate) fn swap_remove(&mut self, pos: usize) -> Link<K> {
        self.links.swap_remove(pos)
    }

    pub(crate) fn position(&self, mut f: impl FnMut(&Link<K>) -> bool) -> Option<usize> {
        self.links.iter().position(|l| f(l))
    }

    #[inline]
    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Link<K>> {
        self.links.iter()
    }

    /// Move every link for which `stays` is false into a new chain.
    pub(crate) fn split_off_where(&mut self, mut stays: impl FnMut(TableIndex) -> bool) -> Chain<K> {
        let mut moved = Chain::default();
        self.links.retain(|l| {
            if stays(l.hash) {
                true
            } else {
                moved.links.push(*l);
                false
            }
        });
        moved
    }

    pub(crate) fn append(&mut self, other: Chain<K>) {
        if self.links.is_empty() {
            self.links = other.links;
        } else {
            self.links.extend(other.links);
        }
    }
}
