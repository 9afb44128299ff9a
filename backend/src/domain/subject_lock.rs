//! Per-subject critical sections.
//!
//! The rate limiter and the points ledger both run a read-check-write
//! sequence that must be serialised per subject: two concurrent callers for
//! the same key must never both pass the precondition check against stale
//! state. This keyed async mutex provides that critical section in-process;
//! the persistence adapters keep their own statements atomic as well.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::user::UserId;

/// A map of per-subject async mutexes.
///
/// Lock entries are created on first use and kept for the process lifetime;
/// the subject population (active users) is small enough that reclamation is
/// not worth the bookkeeping.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl SubjectLocks {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the subject's lock, waiting if another caller holds it.
    pub async fn acquire(&self, subject: &UserId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(
                map.entry(*subject.as_uuid())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        entry.lock_owned().await
    }
}
