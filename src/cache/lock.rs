//! Poison-tolerant access to the locks guarding cache stores.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), source, op, "read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), source, op, "write")
}

// A panic while holding the guard leaves the LRU structurally intact; at worst
// one entry is missing or stale.
fn recover<G>(result: LockResult<G>, source: &'static str, op: &'static str, mode: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target: "lectern::cache",
            source,
            op,
            mode,
            "Recovered poisoned site cache lock"
        );
        poisoned.into_inner()
    })
}
