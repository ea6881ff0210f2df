//! v001 -- Initial schema creation.
//!
//! Creates the `orphaned_attachments` table: the write-ahead log for files
//! created under the managed storage root.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Orphaned attachment files
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS orphaned_attachments (
    id                  TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    local_relative_path TEXT NOT NULL,              -- relative to the storage root
    created_at          TEXT NOT NULL               -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_orphaned_attachments_created_at
    ON orphaned_attachments(created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
