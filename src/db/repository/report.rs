use rusqlite::{params, Connection};
use tracing;

use super::composite::ensure_doctor_exists;
use super::identity::atomically;
use super::{format_timestamp, now_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const SELECT_REPORT: &str = "SELECT reportID, doctorID, details, created_at FROM Reports";

/// Insert a report stamped with the current time, or rewrite its details.
pub fn save_report(conn: &Connection, report: &mut Report) -> Result<(), DatabaseError> {
    let (id, created_at) = atomically(conn, |conn| {
        if !is_persisted(report.id) {
            ensure_doctor_exists(conn, "Report", report.doctor_id)?;
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO Reports (doctorID, details, created_at) VALUES (?1, ?2, ?3)",
                params![report.doctor_id, report.details, format_timestamp(created_at)],
            )?;
            return Ok((conn.last_insert_rowid(), Some(created_at)));
        }

        let changed = conn.execute(
            "UPDATE Reports SET details = ?1 WHERE reportID = ?2",
            params![report.details, report.id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("Report", report.id));
        }
        Ok((report.id, report.created_at))
    })?;

    if !is_persisted(report.id) {
        tracing::info!(report_id = id, doctor_id = report.doctor_id, "Filed report");
    }
    report.id = id;
    report.created_at = created_at;
    Ok(())
}

pub fn get_report(conn: &Connection, report_id: i64) -> Result<Option<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_REPORT} WHERE reportID = ?1"))?;

    let result = stmt.query_row(params![report_id], report_from_row);

    match result {
        Ok(report) => Ok(Some(report)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reports of one doctor; an unknown doctor is `Validation`, not a storage error.
pub fn get_reports_by_doctor(conn: &Connection, doctor_id: i64) -> Result<Vec<Report>, DatabaseError> {
    ensure_doctor_exists(conn, "Report", doctor_id)?;

    let mut stmt = conn.prepare(&format!(
        "{SELECT_REPORT} WHERE doctorID = ?1 ORDER BY created_at DESC, reportID DESC"
    ))?;

    let rows = stmt.query_map(params![doctor_id], report_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn get_all_reports(conn: &Connection) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_REPORT} ORDER BY created_at DESC, reportID DESC"
    ))?;

    let rows = stmt.query_map([], report_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_report(conn: &Connection, report_id: i64) -> Result<bool, DatabaseError> {
    if !is_persisted(report_id) {
        return Ok(false);
    }
    let deleted = conn.execute("DELETE FROM Reports WHERE reportID = ?1", params![report_id])?;
    if deleted > 0 {
        tracing::info!(report_id, "Deleted report");
    }
    Ok(deleted > 0)
}

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let created_at: Option<String> = row.get(3)?;
    Ok(Report {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        details: row.get(2)?,
        created_at: parse_timestamp(created_at.as_deref()),
    })
}
