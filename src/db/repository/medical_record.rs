use rusqlite::{params, Connection};
use tracing;

use super::composite::{ensure_parties_exist, PartyResolver};
use super::identity::atomically;
use super::{
    format_date, format_timestamp, get_doctor, get_patient, now_timestamp, parse_date,
    parse_timestamp,
};
use crate::db::DatabaseError;
use crate::models::*;

const SELECT_RECORD: &str =
    "SELECT recordID, patientID, doctorID, diagnosis, treatment, date, created_at
     FROM MedicalRecords";

struct RecordRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    diagnosis: String,
    treatment: String,
    date: String,
    created_at: Option<String>,
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        diagnosis: row.get(3)?,
        treatment: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl RecordRow {
    fn into_record(self, patient: Patient, doctor: Doctor) -> Result<MedicalRecord, DatabaseError> {
        Ok(MedicalRecord {
            id: self.id,
            patient,
            doctor,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            date: parse_date("MedicalRecord.date", &self.date)?,
            created_at: parse_timestamp(self.created_at.as_deref()),
        })
    }
}

/// Insert or update a record. Updates rewrite diagnosis, treatment and date;
/// the patient and doctor are fixed once filed.
pub fn save_medical_record(conn: &Connection, record: &mut MedicalRecord) -> Result<(), DatabaseError> {
    let patient_id = record.patient.patient_id;
    let doctor_id = record.doctor.doctor_id;

    let (id, created_at) = atomically(conn, |conn| {
        if !is_persisted(record.id) {
            ensure_parties_exist(conn, "MedicalRecord", patient_id, doctor_id)?;
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO MedicalRecords (patientID, doctorID, diagnosis, treatment, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    patient_id,
                    doctor_id,
                    record.diagnosis,
                    record.treatment,
                    format_date(record.date),
                    format_timestamp(created_at),
                ],
            )?;
            return Ok((conn.last_insert_rowid(), Some(created_at)));
        }

        let changed = conn.execute(
            "UPDATE MedicalRecords SET diagnosis = ?1, treatment = ?2, date = ?3 WHERE recordID = ?4",
            params![
                record.diagnosis,
                record.treatment,
                format_date(record.date),
                record.id
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("MedicalRecord", record.id));
        }
        Ok((record.id, record.created_at))
    })?;

    if !is_persisted(record.id) {
        tracing::info!(record_id = id, patient_id, doctor_id, "Filed medical record");
    }
    record.id = id;
    record.created_at = created_at;
    Ok(())
}

pub fn get_medical_record(conn: &Connection, record_id: i64) -> Result<Option<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_RECORD} WHERE recordID = ?1"))?;

    let row = match stmt.query_row(params![record_id], record_row) {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let (patient, doctor) = PartyResolver::new(conn).require(
        "MedicalRecord",
        row.id,
        row.patient_id,
        row.doctor_id,
    )?;
    row.into_record(patient, doctor).map(Some)
}

/// A patient's history, newest first.
///
/// An unknown patient is rejected as `Validation`: the caller named an
/// owner that does not exist, which is a bad request rather than a
/// storage fault.
pub fn get_records_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let patient = get_patient(conn, patient_id)?.ok_or_else(|| {
        DatabaseError::Validation(format!("Invalid patient ID: {patient_id}"))
    })?;
    let rows = query_rows(
        conn,
        &format!("{SELECT_RECORD} WHERE patientID = ?1 ORDER BY date DESC, recordID DESC"),
        params![patient_id],
    )?;
    collect(PartyResolver::new(conn).with_patient(patient), rows)
}

/// Records written by one doctor, newest first. An unknown doctor is
/// `Validation`, as for [`get_records_for_patient`].
pub fn get_records_by_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let doctor = get_doctor(conn, doctor_id)?.ok_or_else(|| {
        DatabaseError::Validation(format!("Invalid doctor ID: {doctor_id}"))
    })?;
    let rows = query_rows(
        conn,
        &format!("{SELECT_RECORD} WHERE doctorID = ?1 ORDER BY date DESC, recordID DESC"),
        params![doctor_id],
    )?;
    collect(PartyResolver::new(conn).with_doctor(doctor), rows)
}

pub fn get_all_medical_records(conn: &Connection) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let rows = query_rows(
        conn,
        &format!("{SELECT_RECORD} ORDER BY date DESC, recordID DESC"),
        [],
    )?;
    collect(PartyResolver::new(conn), rows)
}

pub fn delete_medical_record(conn: &Connection, record_id: i64) -> Result<bool, DatabaseError> {
    if !is_persisted(record_id) {
        return Ok(false);
    }
    let deleted = conn.execute(
        "DELETE FROM MedicalRecords WHERE recordID = ?1",
        params![record_id],
    )?;
    if deleted > 0 {
        tracing::info!(record_id, "Deleted medical record");
    }
    Ok(deleted > 0)
}

fn query_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<RecordRow>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, record_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn collect(
    mut resolver: PartyResolver<'_>,
    rows: Vec<RecordRow>,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some((patient, doctor)) =
            resolver.resolve_or_skip("MedicalRecord", row.id, row.patient_id, row.doctor_id)?
        {
            records.push(row.into_record(patient, doctor)?);
        }
    }
    tracing::debug!(count = records.len(), "Loaded medical records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::repository::{delete_doctor, save_doctor, save_patient};
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parties(conn: &Connection) -> (Patient, Doctor) {
        let mut patient = Patient::new("Jane Smith", "jane@example.com", 28, "female");
        save_patient(conn, &mut patient).unwrap();
        let mut doctor = Doctor::new("Dr. Johnson", "dr.johnson@hospital.com", "Neurology");
        save_doctor(conn, &mut doctor).unwrap();
        (patient, doctor)
    }

    #[test]
    fn record_defaults_to_today_and_round_trips() {
        let conn = test_db();
        let (patient, doctor) = parties(&conn);
        let mut record = MedicalRecord::new(patient, doctor, "Migraine", "Sumatriptan 50mg as needed");
        assert_eq!(record.date, chrono::Local::now().date_naive());

        save_medical_record(&conn, &mut record).unwrap();
        assert!(record.id > 0);
        let loaded = get_medical_record(&conn, record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn update_rewrites_clinical_fields_only() {
        let conn = test_db();
        let (patient, doctor) = parties(&conn);
        let mut record = MedicalRecord::new(patient, doctor, "Hypertension", "Lisinopril 10mg daily");
        save_medical_record(&conn, &mut record).unwrap();

        record.treatment = "Lisinopril 20mg daily".into();
        record.date = date("2025-06-01");
        save_medical_record(&conn, &mut record).unwrap();

        let loaded = get_medical_record(&conn, record.id).unwrap().unwrap();
        assert_eq!(loaded.treatment, "Lisinopril 20mg daily");
        assert_eq!(loaded.date, date("2025-06-01"));
        assert_eq!(get_all_medical_records(&conn).unwrap().len(), 1);
    }

    #[test]
    fn filing_against_unknown_patient_is_rejected() {
        let conn = test_db();
        let (mut patient, doctor) = parties(&conn);
        patient.patient_id = 404;
        let mut record = MedicalRecord::new(patient, doctor, "Flu", "Rest");
        assert!(matches!(
            save_medical_record(&conn, &mut record),
            Err(DatabaseError::Validation(_))
        ));
        assert_eq!(record.id, UNASSIGNED_ID);
    }

    #[test]
    fn history_is_newest_first() {
        let conn = test_db();
        let (patient, doctor) = parties(&conn);
        for (d, diagnosis) in [("2025-01-10", "Cold"), ("2025-03-02", "Sprain"), ("2025-02-14", "Rash")] {
            let mut record = MedicalRecord::new(patient.clone(), doctor.clone(), diagnosis, "Rest");
            record.date = date(d);
            save_medical_record(&conn, &mut record).unwrap();
        }

        let diagnoses: Vec<_> = get_records_for_patient(&conn, patient.patient_id)
            .unwrap()
            .into_iter()
            .map(|r| r.diagnosis)
            .collect();
        assert_eq!(diagnoses, vec!["Sprain", "Rash", "Cold"]);
        assert_eq!(get_records_by_doctor(&conn, doctor.doctor_id).unwrap().len(), 3);
    }

    #[test]
    fn retyped_doctor_breaks_lookup_and_is_skipped_in_lists() {
        let conn = test_db();
        let (patient, doctor) = parties(&conn);
        let mut record = MedicalRecord::new(patient.clone(), doctor.clone(), "Asthma", "Inhaler");
        save_medical_record(&conn, &mut record).unwrap();

        conn.execute(
            "UPDATE Users SET type = 'receptionist' WHERE userID = ?1",
            params![doctor.user.id],
        )
        .unwrap();

        assert!(matches!(
            get_medical_record(&conn, record.id),
            Err(DatabaseError::BrokenReference { .. })
        ));
        assert!(get_records_for_patient(&conn, patient.patient_id).unwrap().is_empty());
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let conn = test_db();
        assert!(matches!(
            get_records_for_patient(&conn, 3),
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            get_records_by_doctor(&conn, 3),
            Err(DatabaseError::Validation(_))
        ));
    }

    #[test]
    fn records_follow_their_doctor_out() {
        let conn = test_db();
        let (patient, doctor) = parties(&conn);
        let mut record = MedicalRecord::new(patient, doctor.clone(), "Migraine", "Rest");
        save_medical_record(&conn, &mut record).unwrap();

        assert!(delete_doctor(&conn, doctor.doctor_id).unwrap());
        assert!(get_medical_record(&conn, record.id).unwrap().is_none());
        assert!(!delete_medical_record(&conn, record.id).unwrap());
    }
}
