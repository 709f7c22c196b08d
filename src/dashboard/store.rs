use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;

use super::models::{MetadataPatch, Snapshot};

/// Holds the one current [`Snapshot`].
///
/// Readers get an `Arc` to an immutable value, so a concurrent commit can
/// never hand them a half-written snapshot. Writers replace the `Arc` under a
/// short write lock; [`SnapshotStore::update`] and
/// [`SnapshotStore::patch_application`] run their read-modify-write inside
/// that same lock so they always build on the latest commit.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Latest committed snapshot.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot wholesale.
    pub fn commit(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        next
    }

    /// Atomically derives the next snapshot from the current one.
    ///
    /// Returning `None` from `f` leaves the store untouched.
    pub fn update<F>(&self, f: F) -> Option<Arc<Snapshot>>
    where
        F: FnOnce(&Snapshot) -> Option<Snapshot>,
    {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let next = Arc::new(f(&current)?);
        *current = Arc::clone(&next);
        Some(next)
    }

    /// Applies `patch` to one application and bumps `lastUpdated`.
    ///
    /// Unknown `app_id` is a no-op and returns `None`.
    pub fn patch_application(&self, app_id: &str, patch: &MetadataPatch) -> Option<Arc<Snapshot>> {
        self.update(|current| {
            let index = current
                .applications
                .iter()
                .position(|app| app.app_id == app_id)?;

            let mut next = current.clone();
            next.applications[index].apply(patch);
            next.last_updated = Some(Utc::now());
            Some(next)
        })
    }
}
