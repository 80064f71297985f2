//! Demo data for a fresh database.
//!
//! Everything goes through the repositories, so seeded rows follow the
//! same identity rules as rows written at runtime.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use tracing;

use super::repository::*;
use super::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::*;

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| DatabaseError::InvalidValue {
        field: "seed.date".into(),
        value: format!("{y}-{m}-{d}"),
    })
}

fn time(h: u32, m: u32) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| DatabaseError::InvalidValue {
        field: "seed.time".into(),
        value: format!("{h}:{m}"),
    })
}

/// Populate an empty database with a small hospital.
///
/// Returns `Ok(false)` without writing when any user already exists.
/// The whole seed is one transaction.
pub fn seed_demo_data(conn: &Connection) -> Result<bool, DatabaseError> {
    if count_users(conn)? > 0 {
        tracing::debug!("Database already populated, skipping seed");
        return Ok(false);
    }

    atomically(conn, |conn| {
        let mut admin = Admin::new("Admin User", "admin@hospital.com");
        save_admin(conn, &mut admin)?;

        let mut cardiology = Doctor::new("Dr. Smith", "dr.smith@hospital.com", "Cardiology");
        save_doctor(conn, &mut cardiology)?;
        let mut neurology = Doctor::new("Dr. Johnson", "dr.johnson@hospital.com", "Neurology");
        save_doctor(conn, &mut neurology)?;

        let mut receptionist = Receptionist::new("Receptionist 1", "reception@hospital.com");
        save_receptionist(conn, &mut receptionist)?;

        let mut john = Patient::new("John Doe", "john@example.com", 35, "male");
        save_patient(conn, &mut john)?;
        let mut jane = Patient::new("Jane Smith", "jane@example.com", 28, "female");
        save_patient(conn, &mut jane)?;
        let mut michael = Patient::new("Michael Brown", "michael@example.com", 42, "male");
        save_patient(conn, &mut michael)?;

        let appointments = [
            (&john, &cardiology, date(2025, 5, 1)?, time(9, 0)?, AppointmentStatus::Scheduled, "Routine checkup"),
            (&jane, &neurology, date(2025, 5, 1)?, time(10, 30)?, AppointmentStatus::Scheduled, "Follow-up appointment"),
            (&john, &neurology, date(2025, 5, 2)?, time(14, 0)?, AppointmentStatus::Completed, "Migraine treatment"),
            (&jane, &cardiology, date(2025, 5, 3)?, time(11, 15)?, AppointmentStatus::Cancelled, "Patient rescheduled"),
            (&michael, &cardiology, date(2025, 5, 4)?, time(13, 45)?, AppointmentStatus::Scheduled, "Initial consultation"),
        ];
        for (patient, doctor, day, at, status, notes) in appointments {
            let mut appointment = Appointment::new(patient.clone(), doctor.clone(), day, at);
            appointment.status = status;
            appointment.notes = Some(notes.into());
            save_appointment(conn, &mut appointment)?;
        }

        let records = [
            (&john, &cardiology, "Hypertension", "Lifestyle changes and medication", date(2025, 4, 15)?),
            (&jane, &neurology, "Migraine", "Prescribed pain relief medication", date(2025, 4, 10)?),
            (&michael, &cardiology, "High cholesterol", "Dietary changes and statins", date(2025, 4, 20)?),
        ];
        for (patient, doctor, diagnosis, treatment, day) in records {
            let mut record = MedicalRecord::new(patient.clone(), doctor.clone(), diagnosis, treatment);
            record.date = day;
            save_medical_record(conn, &mut record)?;
        }

        let prescriptions = [
            (&cardiology, &john, "Lisinopril", "10mg daily", date(2025, 4, 15)?),
            (&neurology, &jane, "Sumatriptan", "50mg as needed", date(2025, 4, 10)?),
            (&cardiology, &michael, "Atorvastatin", "20mg daily", date(2025, 4, 20)?),
        ];
        for (doctor, patient, medicine, dosage, day) in prescriptions {
            let mut prescription =
                Prescription::new(doctor.doctor_id, patient.patient_id, medicine, dosage);
            prescription.date = day;
            save_prescription(conn, &mut prescription)?;
        }

        for (doctor, details) in [
            (&cardiology, "Monthly cardiology department report"),
            (&neurology, "Neurology case study report"),
            (&cardiology, "Patient statistics for Q2 2025"),
        ] {
            let mut report = Report::new(doctor.doctor_id, details);
            save_report(conn, &mut report)?;
        }

        Ok(())
    })?;

    tracing::info!("Seeded demo data");
    Ok(true)
}
