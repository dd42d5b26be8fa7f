//! res-table: a resource table that indexes caller-owned entries by
//! identifier and grows one bucket at a time.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a hash index whose worst-case `add` stays bounded, for call sites
//!   with latency budgets where a full rehash pause is not acceptable.
//! - Layers:
//!   - Identifiers (`Identifier`, `IntId`, `ChronIntId`, `StringId`): equality
//!     plus a raw hash whose low bits already mix in every meaningful key bit.
//!   - `Chain`: the keys sharing one bucket, each with its captured hash.
//!   - `ResTable<ID, K>`: bucket array with linear-hashing growth,
//!     add/remove/lookup/traverse, statistics and self-check.
//!   - `ChronIntIdResTable<K>`: a `ResTable` that numbers its entries itself.
//!
//! Constraints
//! - The table never owns entries. They live in a caller-owned slotmap
//!   (`Arena`) and the table chains their keys; operations that compare
//!   identifiers borrow the arena.
//! - Identifiers are unique within a table; duplicate adds fail and change
//!   nothing.
//! - Capacity only grows. Past full load each `add` splits exactly one
//!   bucket; storage doubling moves chains without rehashing them.
//! - Not synchronized: `Send`, not `Sync`. Share behind a mutex.
//!
//! Hash capture
//! - Each link stores the identifier hash computed at `add`. Splits and
//!   doublings read only the stored hash, so no user code runs while the
//!   table is being restructured. `verify` recomputes it to catch entries
//!   whose identifier changed while installed.
//!
//! Allocation failure
//! - The first storage allocation has nothing to fall back on and its
//!   failure is returned. Later growth is attempted with `try_reserve`; a
//!   failure is logged, the table keeps its current storage, and the next
//!   `add` tries again.
//!
//! Traversal
//! - `traverse` hands each entry to a callback that may ask for that entry
//!   to be unlinked (`Visit::Remove`). The callback has no access to the
//!   table, so removing any other entry mid-walk is ruled out statically.
//!
//! Reentrancy
//! - Debug builds panic if user code called during a chain scan (an
//!   identifier's `PartialEq`, the arena's `get`) comes back into the same
//!   table.

mod arena;
mod chain;
mod chron;
mod error;
mod guard;
mod id;
mod iter;
mod res_table;
mod res_table_proptest;
mod stats;
mod string_id;

pub use arena::{Arena, Resource};
pub use chron::{ChronIntIdResTable, ChronResource};
pub use error::TableError;
pub use id::{
    integer_hash, ChronIntId, Identifier, IntId, IntKey, TableIndex, UNASSIGNED_CHRON_ID,
};
pub use iter::{Entries, Iter};
pub use res_table::{ResTable, Visit, DEFAULT_LOG_TABLE_SIZE, MIN_LOG_TABLE_SIZE};
pub use stats::{TableStats, VerifyError};
pub use string_id::{string_hash, Allocation, StringId};
