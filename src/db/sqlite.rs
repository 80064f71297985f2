use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use tracing;

use super::DatabaseError;

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;"
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, Option<i64>>(0),
    )
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Row counts per table, for startup diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageSummary {
    pub schema_version: i64,
    pub users: i64,
    pub patients: i64,
    pub doctors: i64,
    pub receptionists: i64,
    pub admins: i64,
    pub appointments: i64,
    pub medical_records: i64,
    pub prescriptions: i64,
    pub reports: i64,
}

pub fn summarize(conn: &Connection) -> Result<StorageSummary, DatabaseError> {
    let count = |table: &str| -> Result<i64, DatabaseError> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
    };

    Ok(StorageSummary {
        schema_version: get_current_version(conn),
        users: count("Users")?,
        patients: count("Patients")?,
        doctors: count("Doctors")?,
        receptionists: count("Receptionists")?,
        admins: count("Admins")?,
        appointments: count("Appointments")?,
        medical_records: count("MedicalRecords")?,
        prescriptions: count("Prescriptions")?,
        reports: count("Reports")?,
    })
}
