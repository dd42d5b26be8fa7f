//! String identifiers.
//!
//! The hash is Pearson's permutation hash ("Fast Hashing of Variable Length
//! Text Strings", CACM 1990) run over four interleaved lanes: byte `i` feeds
//! lane `i % 4`. The four one-byte lane results are packed into a 32-bit
//! word and folded with `integer_hash` like any other integer id.

use crate::id::{integer_hash, Identifier, TableIndex};
use std::borrow::Cow;

/// How a `StringId` holds its text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
    /// The id owns a private copy, released when the id is dropped.
    Copied,
    /// The id refers to caller storage that must outlive it.
    Referenced,
}

/// Permutation of 0..=255 driving each hash lane.
static PERMUTATION: [u8; 256] = [
    39, 159, 180, 252, 71, 6, 13, 164, 232, 35, 226, 155, 98, 120, 154, 69, //
    157, 24, 137, 29, 147, 78, 121, 85, 112, 8, 248, 130, 55, 117, 190, 160, //
    176, 131, 228, 64, 211, 106, 38, 27, 140, 30, 88, 210, 227, 104, 84, 77, //
    75, 107, 169, 138, 195, 184, 70, 90, 61, 166, 7, 244, 165, 108, 219, 51, //
    9, 139, 209, 40, 31, 202, 58, 179, 116, 33, 207, 146, 76, 60, 242, 124, //
    254, 197, 80, 167, 153, 145, 129, 233, 132, 48, 246, 86, 156, 177, 36, 187, //
    45, 1, 96, 18, 19, 62, 185, 234, 99, 16, 218, 95, 128, 224, 123, 253, //
    42, 109, 4, 247, 72, 5, 151, 136, 0, 152, 148, 127, 204, 133, 17, 14, //
    182, 217, 54, 199, 119, 174, 82, 57, 215, 41, 114, 208, 206, 110, 239, 23, //
    189, 15, 3, 22, 188, 79, 113, 172, 28, 2, 222, 21, 251, 225, 237, 105, //
    102, 32, 56, 181, 126, 83, 230, 53, 158, 52, 59, 213, 118, 100, 67, 142, //
    220, 170, 144, 115, 205, 26, 125, 168, 249, 66, 175, 97, 255, 92, 229, 91, //
    214, 236, 178, 243, 46, 44, 201, 250, 135, 186, 150, 221, 163, 216, 162, 43, //
    11, 101, 34, 37, 194, 25, 50, 12, 87, 198, 173, 240, 193, 171, 143, 231, //
    111, 141, 191, 103, 74, 245, 223, 20, 161, 235, 122, 63, 89, 149, 73, 238, //
    134, 68, 93, 183, 241, 81, 196, 49, 192, 65, 212, 94, 203, 10, 200, 47, //
];

/// Narrowest table the folded string hash is tuned for (log2).
const STRING_MIN_INDEX_WIDTH: u32 = u8::BITS;
/// Width of the packed lane word.
const STRING_MAX_ID_WIDTH: u32 = u32::BITS;

/// Hash `bytes` up to the end of the slice or the first NUL byte.
pub fn string_hash(bytes: &[u8]) -> TableIndex {
    let mut lanes = [0u8; 4];
    for (i, &c) in bytes.iter().take_while(|&&c| c != 0).enumerate() {
        let lane = &mut lanes[i & 3];
        *lane = PERMUTATION[usize::from(*lane ^ c)];
    }
    let word = u32::from_le_bytes(lanes);
    integer_hash(STRING_MIN_INDEX_WIDTH, STRING_MAX_ID_WIDTH, word as TableIndex)
}

/// Character string identifier, either owning its text or borrowing it.
///
/// Equality compares text, never storage. An id without text (see
/// [`StringId::unnamed`]) hashes to zero and equals nothing, itself included.
#[derive(Clone, Debug, Default)]
pub struct StringId<'a> {
    name: Option<Cow<'a, str>>,
}

impl<'a> StringId<'a> {
    pub fn new(name: &'a str, allocation: Allocation) -> Self {
        let name = match allocation {
            Allocation::Copied => Cow::Owned(name.to_owned()),
            Allocation::Referenced => Cow::Borrowed(name),
        };
        Self { name: Some(name) }
    }

    /// Copy `name` into a self-contained id.
    pub fn copied(name: &str) -> StringId<'static> {
        StringId {
            name: Some(Cow::Owned(name.to_owned())),
        }
    }

    /// Borrow `name` without copying it.
    pub fn referenced(name: &'a str) -> Self {
        Self {
            name: Some(Cow::Borrowed(name)),
        }
    }

    pub fn unnamed() -> Self {
        Self { name: None }
    }

    /// The text this id was built from, if any.
    pub fn resource_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn allocation(&self) -> Option<Allocation> {
        match self.name.as_ref()? {
            Cow::Owned(_) => Some(Allocation::Copied),
            Cow::Borrowed(_) => Some(Allocation::Referenced),
        }
    }

    /// Detach from borrowed storage, copying the text if needed.
    pub fn into_owned(self) -> StringId<'static> {
        StringId {
            name: self.name.map(|n| Cow::Owned(n.into_owned())),
        }
    }

    pub fn show(&self, level: u32) {
        if level > 2 {
            log::info!("resource id = {}", self.resource_name().unwrap_or("<none>"));
        }
    }
}

impl From<String> for StringId<'static> {
    fn from(name: String) -> Self {
        StringId {
            name: Some(Cow::Owned(name)),
        }
    }
}

impl<'a> From<&'a str> for StringId<'a> {
    fn from(name: &'a str) -> Self {
        Self::referenced(name)
    }
}

impl<'a, 'b> PartialEq<StringId<'b>> for StringId<'a> {
    fn eq(&self, other: &StringId<'b>) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<str> for StringId<'_> {
    fn eq(&self, other: &str) -> bool {
        self.name.as_deref() == Some(other)
    }
}

impl PartialEq<&str> for StringId<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.name.as_deref() == Some(*other)
    }
}

impl Identifier for StringId<'_> {
    #[inline]
    fn hash_index(&self) -> TableIndex {
        match &self.name {
            Some(name) => string_hash(name.as_bytes()),
            None => 0,
        }
    }
}

impl Identifier for str {
    #[inline]
    fn hash_index(&self) -> TableIndex {
        string_hash(self.as_bytes())
    }
}
