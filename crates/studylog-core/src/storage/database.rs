//! SQLite-backed key/value blob store.
//!
//! Every piece of state is a JSON blob under a string key; the `kv` table
//! is the only table the application reads or writes.

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::kv::KeyValueStore;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};

/// SQLite database holding the key/value store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/studylog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory, file or schema cannot be set up.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("studylog.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit location.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| CoreError::Database(DatabaseError::MigrationFailed(e.to_string())))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Set several values in one transaction; on error nothing is written.
    pub fn kv_set_many(&self, entries: &[(&str, String)]) -> Result<(), rusqlite::Error> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        Ok(self.kv_set_many(entries)?)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        Ok(self.kv_delete(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn kv_delete() {
        let db = Database::open_memory().unwrap();
        db.kv_set("books", "{}").unwrap();
        db.kv_set("bookOrder", "[]").unwrap();
        db.kv_delete("books").unwrap();
        db.kv_delete("never-set").unwrap();
        assert!(db.kv_get("books").unwrap().is_none());
        assert_eq!(db.kv_get("bookOrder").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn kv_set_many_writes_all() {
        let mut db = Database::open_memory().unwrap();
        db.set_many(&[("books", "{}".to_string()), ("bookOrder", "[]".to_string())])
            .unwrap();
        assert_eq!(db.get("books").unwrap().as_deref(), Some("{}"));
        assert_eq!(db.get("bookOrder").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn kv_set_many_rolls_back_on_failure() {
        let mut db = Database::open_memory().unwrap();
        db.kv_set("books", "old").unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_saved BEFORE INSERT ON kv
                 WHEN NEW.key = 'savedQuestionStates'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = db.set_many(&[
            ("books", "new".to_string()),
            ("savedQuestionStates", "{}".to_string()),
        ]);
        assert!(result.is_err());
        assert_eq!(db.get("books").unwrap().as_deref(), Some("old"));
        assert!(db.get("savedQuestionStates").unwrap().is_none());
    }

    #[test]
    fn reopening_file_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studylog.db");
        {
            let mut db = Database::open_at(&path).unwrap();
            db.set("examDate", "\"2026-11-08\"").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get("examDate").unwrap().as_deref(), Some("\"2026-11-08\""));
    }
}
