//! Domain model structs persisted in the local database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A locally created attachment file that has not yet been claimed by a
/// committed attachment record.
///
/// Rows are inserted by the validation pipeline the moment a new file is
/// written under the managed storage root, deleted by the persistence layer
/// once the owning attachment commits, and otherwise reclaimed (file and row
/// both) by the external sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrphanedAttachment {
    /// Unique tracking identifier.
    pub id: Uuid,
    /// File path relative to the managed storage root.
    pub local_relative_path: String,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
}
