use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use crate::domain::types::EntityKind;

pub(crate) fn read<T>(lock: &RwLock<T>, kind: EntityKind) -> RwLockReadGuard<'_, T> {
    recover(lock.read(), kind, "read")
}

pub(crate) fn write<T>(lock: &RwLock<T>, kind: EntityKind) -> RwLockWriteGuard<'_, T> {
    recover(lock.write(), kind, "write")
}

// Entries never change once written, so the guard behind a poisoned lock
// still mirrors the store.
fn recover<G>(result: LockResult<G>, kind: EntityKind, access: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target = "orderflow::cache",
            kind = %kind,
            access,
            "cache lock poisoned by a panicked writer; continuing with recovered guard"
        );
        poisoned.into_inner()
    })
}
