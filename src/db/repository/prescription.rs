use rusqlite::{params, Connection};
use tracing;

use super::composite::ensure_parties_exist;
use super::format_date;
use super::identity::atomically;
use crate::db::DatabaseError;
use crate::models::*;

/// Insert a prescription. Prescriptions are write-only: once issued they
/// are never updated through this layer, so a persisted id is rejected.
pub fn save_prescription(conn: &Connection, prescription: &mut Prescription) -> Result<(), DatabaseError> {
    if is_persisted(prescription.id) {
        return Err(DatabaseError::Validation(format!(
            "Prescription {} is already issued",
            prescription.id
        )));
    }

    let id = atomically(conn, |conn| {
        ensure_parties_exist(conn, "Prescription", prescription.patient_id, prescription.doctor_id)?;
        conn.execute(
            "INSERT INTO Prescriptions (doctorID, patientID, medicine, dosage, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                prescription.doctor_id,
                prescription.patient_id,
                prescription.medicine,
                prescription.dosage,
                format_date(prescription.date),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    tracing::info!(
        prescription_id = id,
        doctor_id = prescription.doctor_id,
        patient_id = prescription.patient_id,
        "Issued prescription"
    );
    prescription.id = id;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{delete_patient, save_doctor, save_patient};
    use crate::db::sqlite::open_memory_database;

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM Prescriptions", [], |row| row.get(0))
            .unwrap()
    }

    fn parties(conn: &Connection) -> (Patient, Doctor) {
        let mut patient = Patient::new("John Doe", "john@example.com", 35, "male");
        save_patient(conn, &mut patient).unwrap();
        let mut doctor = Doctor::new("Dr. Smith", "dr.smith@hospital.com", "Cardiology");
        save_doctor(conn, &mut doctor).unwrap();
        (patient, doctor)
    }

    #[test]
    fn issue_prescription_dated_today() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut prescription =
            Prescription::new(doctor.doctor_id, patient.patient_id, "Lisinopril", "10mg daily");
        save_prescription(&conn, &mut prescription).unwrap();

        assert!(prescription.id > 0);
        let (medicine, date): (String, String) = conn
            .query_row(
                "SELECT medicine, date FROM Prescriptions WHERE prescriptionID = ?1",
                params![prescription.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(medicine, "Lisinopril");
        assert_eq!(date, format_date(chrono::Local::now().date_naive()));
    }

    #[test]
    fn reissue_is_rejected() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut prescription =
            Prescription::new(doctor.doctor_id, patient.patient_id, "Aspirin", "81mg daily");
        save_prescription(&conn, &mut prescription).unwrap();

        assert!(matches!(
            save_prescription(&conn, &mut prescription),
            Err(DatabaseError::Validation(_))
        ));
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn unknown_parties_are_rejected() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut bad_doctor = Prescription::new(99, patient.patient_id, "Aspirin", "81mg");
        let mut bad_patient = Prescription::new(doctor.doctor_id, 99, "Aspirin", "81mg");
        assert!(save_prescription(&conn, &mut bad_doctor).is_err());
        assert!(save_prescription(&conn, &mut bad_patient).is_err());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn prescriptions_cascade_with_patient() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut prescription =
            Prescription::new(doctor.doctor_id, patient.patient_id, "Metformin", "500mg twice daily");
        save_prescription(&conn, &mut prescription).unwrap();

        delete_patient(&conn, patient.patient_id).unwrap();
        assert_eq!(count(&conn), 0);
    }
}
