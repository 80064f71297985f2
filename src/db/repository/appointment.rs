use std::str::FromStr;

use rusqlite::{params, Connection};
use tracing;

use super::composite::{ensure_parties_exist, PartyResolver};
use super::identity::atomically;
use super::{
    format_date, format_time, format_timestamp, get_doctor, get_patient, now_timestamp, parse_date,
    parse_time, parse_timestamp,
};
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const SELECT_APPOINTMENT: &str =
    "SELECT appointmentID, patientID, doctorID, date, time, status, notes, created_at
     FROM Appointments";

struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: String,
    time: String,
    status: String,
    notes: Option<String>,
    created_at: Option<String>,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl AppointmentRow {
    fn into_appointment(self, patient: Patient, doctor: Doctor) -> Result<Appointment, DatabaseError> {
        Ok(Appointment {
            id: self.id,
            patient,
            doctor,
            date: parse_date("Appointment.date", &self.date)?,
            time: parse_time("Appointment.time", &self.time)?,
            status: AppointmentStatus::from_str(&self.status)?,
            notes: self.notes,
            created_at: parse_timestamp(self.created_at.as_deref()),
        })
    }
}

/// Insert or update an appointment.
///
/// Both parties must already exist; the check runs before any statement.
pub fn save_appointment(conn: &Connection, appointment: &mut Appointment) -> Result<(), DatabaseError> {
    let patient_id = appointment.patient.patient_id;
    let doctor_id = appointment.doctor.doctor_id;

    let (id, created_at) = atomically(conn, |conn| {
        ensure_parties_exist(conn, "Appointment", patient_id, doctor_id)?;

        if !is_persisted(appointment.id) {
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO Appointments (patientID, doctorID, date, time, status, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    patient_id,
                    doctor_id,
                    format_date(appointment.date),
                    format_time(appointment.time),
                    appointment.status.as_str(),
                    appointment.notes,
                    format_timestamp(created_at),
                ],
            )?;
            return Ok((conn.last_insert_rowid(), Some(created_at)));
        }

        let changed = conn.execute(
            "UPDATE Appointments
             SET patientID = ?1, doctorID = ?2, date = ?3, time = ?4, status = ?5, notes = ?6
             WHERE appointmentID = ?7",
            params![
                patient_id,
                doctor_id,
                format_date(appointment.date),
                format_time(appointment.time),
                appointment.status.as_str(),
                appointment.notes,
                appointment.id,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("Appointment", appointment.id));
        }
        Ok((appointment.id, appointment.created_at))
    })?;

    if !is_persisted(appointment.id) {
        tracing::info!(appointment_id = id, patient_id, doctor_id, "Booked appointment");
    }
    appointment.id = id;
    appointment.created_at = created_at;
    Ok(())
}

/// Single-row lookup. A row whose patient or doctor has vanished is a
/// `BrokenReference`, never a partial object.
pub fn get_appointment(conn: &Connection, appointment_id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_APPOINTMENT} WHERE appointmentID = ?1"))?;

    let row = match stmt.query_row(params![appointment_id], appointment_row) {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let (patient, doctor) = PartyResolver::new(conn).require(
        "Appointment",
        row.id,
        row.patient_id,
        row.doctor_id,
    )?;

    row.into_appointment(patient, doctor).map(Some)
}

/// Appointments of one patient, by date then time.
///
/// An unknown patient is rejected as `Validation`: the caller named an
/// owner that does not exist, which is a bad request rather than a
/// storage fault.
pub fn get_appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let patient = get_patient(conn, patient_id)?.ok_or_else(|| {
        DatabaseError::Validation(format!("Invalid patient ID: {patient_id}"))
    })?;
    let rows = query_rows(
        conn,
        &format!("{SELECT_APPOINTMENT} WHERE patientID = ?1 ORDER BY date, time, appointmentID"),
        params![patient_id],
    )?;
    collect(PartyResolver::new(conn).with_patient(patient), rows)
}

/// Appointments of one doctor, by date then time.
///
/// An unknown doctor is rejected as `Validation`: the caller named an
/// owner that does not exist, which is a bad request rather than a
/// storage fault.
pub fn get_appointments_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let doctor = get_doctor(conn, doctor_id)?.ok_or_else(|| {
        DatabaseError::Validation(format!("Invalid doctor ID: {doctor_id}"))
    })?;
    let rows = query_rows(
        conn,
        &format!("{SELECT_APPOINTMENT} WHERE doctorID = ?1 ORDER BY date, time, appointmentID"),
        params![doctor_id],
    )?;
    collect(PartyResolver::new(conn).with_doctor(doctor), rows)
}

pub fn get_all_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let rows = query_rows(
        conn,
        &format!("{SELECT_APPOINTMENT} ORDER BY date, time, appointmentID"),
        [],
    )?;
    collect(PartyResolver::new(conn), rows)
}

pub fn delete_appointment(conn: &Connection, appointment_id: i64) -> Result<bool, DatabaseError> {
    if !is_persisted(appointment_id) {
        return Ok(false);
    }
    let deleted = conn.execute(
        "DELETE FROM Appointments WHERE appointmentID = ?1",
        params![appointment_id],
    )?;
    if deleted > 0 {
        tracing::info!(appointment_id, "Deleted appointment");
    }
    Ok(deleted > 0)
}

fn query_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<AppointmentRow>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, appointment_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// List reads skip rows whose parties cannot be resolved.
fn collect(
    mut resolver: PartyResolver<'_>,
    rows: Vec<AppointmentRow>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut appointments = Vec::with_capacity(rows.len());
    for row in rows {
        let Some((patient, doctor)) =
            resolver.resolve_or_skip("Appointment", row.id, row.patient_id, row.doctor_id)?
        else {
            continue;
        };
        appointments.push(row.into_appointment(patient, doctor)?);
    }
    tracing::debug!(count = appointments.len(), "Loaded appointments");
    Ok(appointments)
}
