//! Role actions: what a patient, doctor, receptionist or admin can do.
//!
//! Each action runs in one transaction on the shared [`Database`], so the
//! lookups it performs and the rows it writes commit together.

use chrono::{NaiveDate, NaiveTime};

use crate::db::repository::{
    get_appointment, get_doctor, get_patient, save_appointment, save_doctor, save_medical_record,
    save_patient, save_prescription, save_report,
};
use crate::db::{Database, DatabaseError};
use crate::models::enums::AppointmentStatus;
use crate::models::*;

fn known_patient(conn: &rusqlite::Connection, patient_id: i64) -> Result<Patient, DatabaseError> {
    get_patient(conn, patient_id)?
        .ok_or_else(|| DatabaseError::Validation(format!("Invalid patient ID: {patient_id}")))
}

fn known_doctor(conn: &rusqlite::Connection, doctor_id: i64) -> Result<Doctor, DatabaseError> {
    get_doctor(conn, doctor_id)?
        .ok_or_else(|| DatabaseError::Validation(format!("Invalid doctor ID: {doctor_id}")))
}

// ─── Registration ──────────────────────────────────────────────────

pub fn register_patient(
    db: &Database,
    name: &str,
    contact: &str,
    age: u32,
    gender: &str,
) -> Result<Patient, DatabaseError> {
    db.transaction(|conn| {
        let mut patient = Patient::new(name, contact, age, gender);
        save_patient(conn, &mut patient)?;
        Ok(patient)
    })
}

pub fn register_doctor(
    db: &Database,
    name: &str,
    contact: &str,
    specialization: &str,
) -> Result<Doctor, DatabaseError> {
    db.transaction(|conn| {
        let mut doctor = Doctor::new(name, contact, specialization);
        save_doctor(conn, &mut doctor)?;
        Ok(doctor)
    })
}

// ─── Appointments ──────────────────────────────────────────────────

/// Book a visit for an existing patient with an existing doctor.
/// Used both for patient self-service and by the front desk.
pub fn book_appointment(
    db: &Database,
    patient_id: i64,
    doctor_id: i64,
    date: NaiveDate,
    time: NaiveTime,
    notes: Option<&str>,
) -> Result<Appointment, DatabaseError> {
    db.transaction(|conn| {
        let patient = known_patient(conn, patient_id)?;
        let doctor = known_doctor(conn, doctor_id)?;

        let mut appointment = Appointment::new(patient, doctor, date, time);
        appointment.notes = notes.map(str::to_owned);
        save_appointment(conn, &mut appointment)?;
        Ok(appointment)
    })
}

pub fn update_appointment_status(
    db: &Database,
    appointment_id: i64,
    status: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    db.transaction(|conn| {
        let mut appointment = get_appointment(conn, appointment_id)?
            .ok_or_else(|| DatabaseError::not_found("Appointment", appointment_id))?;
        appointment.status = status;
        save_appointment(conn, &mut appointment)?;
        Ok(appointment)
    })
}

/// Move a visit to a new slot. A moved visit is scheduled again, even if
/// it had been cancelled.
pub fn reschedule_appointment(
    db: &Database,
    appointment_id: i64,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Appointment, DatabaseError> {
    db.transaction(|conn| {
        let mut appointment = get_appointment(conn, appointment_id)?
            .ok_or_else(|| DatabaseError::not_found("Appointment", appointment_id))?;
        appointment.date = date;
        appointment.time = time;
        appointment.status = AppointmentStatus::Scheduled;
        save_appointment(conn, &mut appointment)?;
        Ok(appointment)
    })
}

// ─── Doctor actions ────────────────────────────────────────────────

pub fn prescribe_medicine(
    db: &Database,
    doctor_id: i64,
    patient_id: i64,
    medicine: &str,
    dosage: &str,
) -> Result<Prescription, DatabaseError> {
    db.transaction(|conn| {
        let mut prescription = Prescription::new(doctor_id, patient_id, medicine, dosage);
        save_prescription(conn, &mut prescription)?;
        Ok(prescription)
    })
}

/// File a new record dated today.
pub fn update_patient_records(
    db: &Database,
    doctor_id: i64,
    patient_id: i64,
    diagnosis: &str,
    treatment: &str,
) -> Result<MedicalRecord, DatabaseError> {
    db.transaction(|conn| {
        let patient = known_patient(conn, patient_id)?;
        let doctor = known_doctor(conn, doctor_id)?;

        let mut record = MedicalRecord::new(patient, doctor, diagnosis, treatment);
        save_medical_record(conn, &mut record)?;
        Ok(record)
    })
}

pub fn file_report(db: &Database, doctor_id: i64, details: &str) -> Result<Report, DatabaseError> {
    db.transaction(|conn| {
        let mut report = Report::new(doctor_id, details);
        save_report(conn, &mut report)?;
        Ok(report)
    })
}

// ─── Admin actions ─────────────────────────────────────────────────

/// `Ok(false)` when the user does not exist.
pub fn manage_user(db: &Database, user_id: i64, action: &UserAction) -> Result<bool, DatabaseError> {
    db.transaction(|conn| crate::db::repository::manage_user(conn, user_id, action))
}
