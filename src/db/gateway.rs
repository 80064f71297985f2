//! Storage gateway: the one database handle shared by every repository.
//!
//! Constructed once by the composition root and passed down by reference
//! (wrap it in `Arc` to share across threads). Every access goes through a
//! `Mutex`, so statements from concurrent callers never interleave on the
//! handle.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file and bring its schema up to date.
    ///
    /// Failing to open is fatal for the caller: there is no fallback handle.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            path: None,
        }
    }

    /// Backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Run one or more statements that produce no result set.
    pub fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Exclusive access to the raw handle for the duration of `f`.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.lock()?;
        f(&*conn)
    }

    /// Run `f` inside one transaction: commit on `Ok`, roll back on `Err`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        match f(&*tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transaction rolled back");
                tx.rollback()?;
                Err(e)
            }
        }
    }
}
