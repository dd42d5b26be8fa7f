//! Identifier contract and the integer identifiers built on it.
//!
//! An identifier only has to say whether it equals another one and turn
//! itself into a raw `TableIndex`. The table masks that index down to its
//! current bucket count, so a good identifier makes sure the low-order bits
//! already depend on every meaningful bit of the key. `integer_hash` does
//! that folding for fixed-width integers.

use core::fmt;

/// Raw hash produced by an identifier, before masking to a bucket.
pub type TableIndex = usize;

/// Key type for a `ResTable`.
///
/// Equal identifiers must produce equal `hash_index` values. The table
/// captures the hash once at insertion and never asks again, so the hash of
/// an installed identifier must not change while it is resident.
pub trait Identifier: PartialEq {
    fn hash_index(&self) -> TableIndex;
}

impl<I: Identifier + ?Sized> Identifier for &I {
    #[inline]
    fn hash_index(&self) -> TableIndex {
        (**self).hash_index()
    }
}

/// Fold `id` onto itself so that all of its `max_id_width` low bits
/// contribute to the lowest `min_index_width` bits of the result.
///
/// The working width is halved and the value XORed with itself shifted by
/// that width, at least once, until the width reaches `min_index_width`.
/// A zero-width fold would clear the value, so folding stops before it.
#[inline]
pub const fn integer_hash(min_index_width: u32, max_id_width: u32, id: TableIndex) -> TableIndex {
    let mut hash = id;
    let mut width = max_id_width;
    loop {
        width >>= 1;
        if width == 0 {
            break;
        }
        if width < TableIndex::BITS {
            hash ^= hash >> width;
        }
        if width <= min_index_width {
            break;
        }
    }
    hash
}

/// Primitive integers usable inside an `IntId`.
pub trait IntKey: Copy + Eq + fmt::Debug {
    /// Bit width of the integer type.
    const BITS: u32;

    /// Reinterpret as a table index. Wider types are truncated and signed
    /// types wrap, which is fine for hashing.
    fn to_index(self) -> TableIndex;
}

macro_rules! impl_int_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntKey for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn to_index(self) -> TableIndex {
                    self as TableIndex
                }
            }
        )*
    };
}

impl_int_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Fixed-width integer identifier.
///
/// `MIN_INDEX_WIDTH` is the log2 of the smallest table the id is expected
/// to index; folding stops once the hash is that narrow. `MAX_ID_WIDTH` is
/// the number of low bits that can ever be set in an id; `0` means the full
/// width of `T`. Hashing is cheaper the closer the two widths are.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntId<T, const MIN_INDEX_WIDTH: u32 = 4, const MAX_ID_WIDTH: u32 = 0> {
    id: T,
}

impl<T: IntKey, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32>
    IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    pub const fn new(id: T) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> T {
        self.id
    }

    const fn id_width() -> u32 {
        if MAX_ID_WIDTH == 0 {
            T::BITS
        } else {
            MAX_ID_WIDTH
        }
    }
}

impl<T: IntKey, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> Identifier
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    #[inline]
    fn hash_index(&self) -> TableIndex {
        integer_hash(MIN_INDEX_WIDTH, Self::id_width(), self.id.to_index())
    }
}

impl<T: IntKey, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> From<T>
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    fn from(id: T) -> Self {
        Self::new(id)
    }
}

impl<T: fmt::Display, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> fmt::Display
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// Identifier handed out in allocation order by a `ChronIntIdResTable`.
pub type ChronIntId = IntId<u32, 8, 32>;

/// Id carried by a chronological resource before its table assigns one.
pub const UNASSIGNED_CHRON_ID: ChronIntId = ChronIntId::new(u32::MAX);
