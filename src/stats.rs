//! Occupancy statistics and self-check failures.

use crate::id::TableIndex;
use core::fmt;

/// Bucket occupancy snapshot returned by `ResTable::stats`.
///
/// `mean` and `std_dev` are taken over all logical buckets, empty ones
/// included, so a well-spread table at full load shows a mean near 1.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TableStats {
    /// Logical bucket count (the addressed region).
    pub buckets: usize,
    /// Buckets of backing storage, including the not yet split region.
    pub allocated: usize,
    /// Entries the table believes are installed.
    pub entries: usize,
    /// Entries found by walking every chain.
    pub counted: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Length of the longest chain.
    pub max_chain: usize,
}

impl TableStats {
    pub(crate) fn from_chain_lengths(
        lengths: impl Iterator<Item = usize>,
        buckets: usize,
        allocated: usize,
        entries: usize,
    ) -> Self {
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut counted = 0usize;
        let mut max_chain = 0usize;
        for n in lengths {
            counted += n;
            sum += n as f64;
            sum_sq += (n * n) as f64;
            max_chain = max_chain.max(n);
        }
        let (mean, std_dev) = if buckets == 0 {
            (0.0, 0.0)
        } else {
            let mean = sum / buckets as f64;
            // Clamp rounding noise below zero before the root.
            let var = (sum_sq / buckets as f64 - mean * mean).max(0.0);
            (mean, var.sqrt())
        };
        Self {
            buckets,
            allocated,
            entries,
            counted,
            mean,
            std_dev,
            max_chain,
        }
    }

    /// Whether the chain walk agrees with the installed count.
    pub fn is_consistent(&self) -> bool {
        self.counted == self.entries
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries per bucket: mean = {:.6} std dev = {:.6} max = {}",
            self.mean, self.std_dev, self.max_chain
        )
    }
}

/// A broken table invariant found by `ResTable::verify`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("split state is inconsistent: {0}")]
    SplitState(&'static str),

    #[error("bucket {bucket} holds a key that no longer resolves in the arena")]
    StaleKey { bucket: usize },

    #[error("bucket {bucket} holds an entry whose identifier hash changed after insertion")]
    HashChanged { bucket: usize },

    #[error("entry with hash {hash:#x} sits in bucket {bucket} but addresses bucket {expected}")]
    Misplaced {
        bucket: usize,
        expected: usize,
        hash: TableIndex,
    },

    #[error("bucket {bucket} holds two entries with equal identifiers")]
    DuplicateId { bucket: usize },

    #[error("storage bucket {bucket} lies beyond the addressed region but is not empty")]
    UnaddressedBucket { bucket: usize },

    #[error("{counted} entries found in chains, {installed} recorded as installed")]
    CountMismatch { counted: usize, installed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_occupancy_has_no_spread() {
        let s = TableStats::from_chain_lengths([1usize; 16].into_iter(), 16, 32, 16);
        assert_eq!(s.mean, 1.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.max_chain, 1);
        assert!(s.is_consistent());
    }

    #[test]
    fn skewed_occupancy() {
        // One chain of 4 among 4 buckets: mean 1, variance 4 - 1 = 3.
        let s = TableStats::from_chain_lengths([4usize, 0, 0, 0].into_iter(), 4, 8, 5);
        assert_eq!(s.mean, 1.0);
        assert!((s.std_dev - 3.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.max_chain, 4);
        assert!(!s.is_consistent());
    }

    #[test]
    fn empty_table_stats() {
        let s = TableStats::from_chain_lengths(core::iter::empty(), 0, 0, 0);
        assert_eq!(s, TableStats::default());
        assert_eq!(
            s.to_string(),
            "entries per bucket: mean = 0.000000 std dev = 0.000000 max = 0"
        );
    }
}
