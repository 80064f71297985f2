//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per entity; every public function is re-exported here.
//! All functions take a borrowed `Connection` so callers choose the
//! transaction scope (see [`crate::db::Database::transaction`]).

mod admin;
mod appointment;
mod composite;
mod doctor;
mod identity;
mod medical_record;
mod patient;
mod prescription;
mod receptionist;
mod report;
mod user;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use super::DatabaseError;

// Re-export all public items from sub-modules
pub use admin::*;
pub use appointment::*;
pub use doctor::*;
pub use medical_record::*;
pub use patient::*;
pub use prescription::*;
pub use receptionist::*;
pub use report::*;
pub use user::*;

pub(crate) use identity::atomically;

// ─── Stored date/time text ─────────────────────────────────────────

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";
/// Same shape SQLite's `CURRENT_TIMESTAMP` produces (UTC).
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

/// Clock times are stored to the minute.
pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Accepts `HH:MM` and, for rows written by other tools, `HH:MM:SS`.
pub(crate) fn parse_time(field: &str, value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| DatabaseError::InvalidValue {
            field: field.into(),
            value: value.into(),
        })
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Creation stamps are informational; unreadable text maps to `None`.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value?;
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Current UTC time at whole-second precision, so a stamp survives a
/// store/load cycle unchanged.
pub(crate) fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
