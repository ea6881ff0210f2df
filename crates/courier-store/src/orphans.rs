//! Typed CRUD for the `orphaned_attachments` table.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::OrphanedAttachment;

impl Database {
    pub fn insert_orphan(&self, orphan: &OrphanedAttachment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO orphaned_attachments (id, local_relative_path, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                orphan.id.to_string(),
                orphan.local_relative_path,
                orphan.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_orphan(&self, id: Uuid) -> Result<OrphanedAttachment> {
        self.conn()
            .query_row(
                "SELECT id, local_relative_path, created_at
                 FROM orphaned_attachments
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_orphan,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn list_orphans(&self) -> Result<Vec<OrphanedAttachment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, local_relative_path, created_at
             FROM orphaned_attachments
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map([], row_to_orphan)?;

        let mut orphans = Vec::new();
        for row in rows {
            orphans.push(row?);
        }
        Ok(orphans)
    }

    // only removes the registry row, not the file on disk
    pub fn delete_orphan(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM orphaned_attachments WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_orphan(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrphanedAttachment> {
    let id_str: String = row.get(0)?;
    let local_relative_path: String = row.get(1)?;
    let created_str: String = row.get(2)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(OrphanedAttachment {
        id,
        local_relative_path,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    fn sample(path: &str) -> OrphanedAttachment {
        OrphanedAttachment {
            id: Uuid::new_v4(),
            local_relative_path: path.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let (db, _dir) = test_db();
        let orphan = sample("ab/cdef");

        db.insert_orphan(&orphan).unwrap();
        let fetched = db.get_orphan(orphan.id).unwrap();
        assert_eq!(fetched.id, orphan.id);
        assert_eq!(fetched.local_relative_path, orphan.local_relative_path);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.get_orphan(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_delete() {
        let (db, _dir) = test_db();
        let orphan = sample("file-1");
        db.insert_orphan(&orphan).unwrap();

        assert!(db.delete_orphan(orphan.id).unwrap());
        assert!(!db.delete_orphan(orphan.id).unwrap());
    }

    #[test]
    fn test_list() {
        let (db, _dir) = test_db();
        let a = sample("file-a");
        let b = sample("file-b");
        db.insert_orphan(&a).unwrap();
        db.insert_orphan(&b).unwrap();

        let all = db.list_orphans().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let orphan = sample("persistent-file");

        {
            let db = Database::open_at(&path).unwrap();
            db.insert_orphan(&orphan).unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get_orphan(orphan.id).unwrap(), orphan);
    }
}
