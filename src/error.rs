use std::collections::TryReserveError;

/// Failures reported by table operations.
///
/// A missing identifier is not an error: `lookup` and `remove` return
/// `None` for it.
#[derive(thiserror::Error, Debug)]
pub enum TableError {
    /// An entry with an equal identifier is already installed. Nothing changed.
    #[error("an entry with an equal identifier is already installed")]
    DuplicateKey,

    /// The key handed to the table does not resolve in the arena.
    #[error("key does not resolve to a live entry in the arena")]
    StaleHandle,

    /// The requested bucket count does not fit in the index type.
    #[error("a table of 2^{log2} buckets cannot be addressed")]
    CapacityOverflow { log2: u32 },

    /// The first bucket allocation failed, so the table has no storage to
    /// fall back on. Later growth failures are absorbed by the table.
    #[error("failed to allocate bucket storage: {0}")]
    Alloc(#[from] TryReserveError),

    /// Every chronological id is in use.
    #[error("all 2^32 chronological ids are in use")]
    IdSpaceExhausted,
}
