//! Shared handle over the orphan registry.
//!
//! Multiple validations may run concurrently; the ledger serializes their
//! registrations behind a mutex while identifier uniqueness (fresh UUID per
//! registration) keeps unrelated registrations from ever colliding.

use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::OrphanedAttachment;

/// Thread-safe write-ahead log for files created under the storage root.
pub struct OrphanLedger {
    db: Mutex<Database>,
}

impl OrphanLedger {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Record a newly created file, returning its tracking identifier.
    ///
    /// Must be called before control returns to the caller that requested the
    /// file's creation, so a crash can never strand an untracked file.
    pub fn register(&self, local_relative_path: &str) -> Result<Uuid> {
        let orphan = OrphanedAttachment {
            id: Uuid::new_v4(),
            local_relative_path: local_relative_path.to_string(),
            created_at: Utc::now(),
        };

        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.insert_orphan(&orphan)?;

        debug!(id = %orphan.id, path = %orphan.local_relative_path, "registered orphan file");
        Ok(orphan.id)
    }

    /// Drop a registration once the owning attachment record has committed.
    ///
    /// Called by the persistence boundary, never by the validation pipeline.
    pub fn deregister(&self, id: Uuid) -> Result<bool> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.delete_orphan(id)
    }

    /// All currently registered orphans, oldest first.  Consumed by the
    /// external sweep.
    pub fn list(&self) -> Result<Vec<OrphanedAttachment>> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.list_orphans()
    }
}
