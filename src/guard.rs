//! Debug-only detector for nested entry into a table.
//!
//! The table calls back into user code while its state is in flux: the
//! identifier's `PartialEq` during chain scans and the arena's `get`.
//! Neither may come back into the same table. Debug builds flag active
//! entries and panic on nesting; release builds keep no state at all.
//!
//! The flag is a `Cell`, so a table is `Send` but not `Sync`. Callers
//! that share one across threads serialize access with a mutex.

use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct NestingGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    #[cfg(not(debug_assertions))]
    _not_sync: PhantomData<Cell<()>>,
}

impl NestingGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            #[cfg(not(debug_assertions))]
            _not_sync: PhantomData,
        }
    }

    /// Mark the table busy until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "nested entry into a resource table from a callback"
            );
            return Entered { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return Entered { _owner: PhantomData };
        }
    }
}

pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a NestingGuard,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a NestingGuard>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner.active.set(false);
        }
    }
}
