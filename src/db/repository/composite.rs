//! Composite reconstruction: rebuilding rows that embed a live Patient
//! and Doctor by reading each through its own repository.

use std::collections::HashMap;

use rusqlite::Connection;
use tracing;

use super::doctor::get_doctor;
use super::patient::get_patient;
use crate::db::DatabaseError;
use crate::models::{is_persisted, Doctor, Patient};

/// Per-call memo of patient/doctor reads.
///
/// Every value handed out is a fresh clone owned by the caller.
pub(crate) struct PartyResolver<'c> {
    conn: &'c Connection,
    patients: HashMap<i64, Option<Patient>>,
    doctors: HashMap<i64, Option<Doctor>>,
}

impl<'c> PartyResolver<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            patients: HashMap::new(),
            doctors: HashMap::new(),
        }
    }

    /// Seed the memo with an owner already loaded by the caller.
    pub(crate) fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.insert(patient.patient_id, Some(patient));
        self
    }

    pub(crate) fn with_doctor(mut self, doctor: Doctor) -> Self {
        self.doctors.insert(doctor.doctor_id, Some(doctor));
        self
    }

    fn patient(&mut self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        if let Some(cached) = self.patients.get(&id) {
            return Ok(cached.clone());
        }
        let found = get_patient(self.conn, id)?;
        self.patients.insert(id, found.clone());
        Ok(found)
    }

    fn doctor(&mut self, id: i64) -> Result<Option<Doctor>, DatabaseError> {
        if let Some(cached) = self.doctors.get(&id) {
            return Ok(cached.clone());
        }
        let found = get_doctor(self.conn, id)?;
        self.doctors.insert(id, found.clone());
        Ok(found)
    }

    /// Both parties of one row, or a description of the one that is missing.
    fn parties(
        &mut self,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<Result<(Patient, Doctor), String>, DatabaseError> {
        let patient = self.patient(patient_id)?;
        let doctor = self.doctor(doctor_id)?;
        Ok(match (patient, doctor) {
            (Some(patient), Some(doctor)) => Ok((patient, doctor)),
            (None, _) => Err(format!("Patient {patient_id}")),
            (Some(_), None) => Err(format!("Doctor {doctor_id}")),
        })
    }

    /// Single-row lookups: never hand out a partial object, a missing
    /// party is a `BrokenReference`.
    pub(crate) fn require(
        &mut self,
        entity_type: &str,
        row_id: i64,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<(Patient, Doctor), DatabaseError> {
        self.parties(patient_id, doctor_id)?
            .map_err(|reference| DatabaseError::BrokenReference {
                entity_type: entity_type.into(),
                id: row_id.to_string(),
                reference,
            })
    }

    /// List lookups: a row with a missing party is logged and dropped.
    pub(crate) fn resolve_or_skip(
        &mut self,
        entity_type: &str,
        row_id: i64,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<Option<(Patient, Doctor)>, DatabaseError> {
        match self.parties(patient_id, doctor_id)? {
            Ok(pair) => Ok(Some(pair)),
            Err(reference) => {
                tracing::warn!(
                    entity = entity_type,
                    id = row_id,
                    missing = %reference,
                    "Skipping row with unresolvable reference"
                );
                Ok(None)
            }
        }
    }
}

/// Write-time referential check for rows that point at a patient and a doctor.
///
/// Runs before any statement so a bad booking never reaches storage.
pub(crate) fn ensure_parties_exist(
    conn: &Connection,
    entity_type: &str,
    patient_id: i64,
    doctor_id: i64,
) -> Result<(), DatabaseError> {
    ensure_patient_exists(conn, entity_type, patient_id)?;
    ensure_doctor_exists(conn, entity_type, doctor_id)
}

pub(crate) fn ensure_patient_exists(
    conn: &Connection,
    entity_type: &str,
    patient_id: i64,
) -> Result<(), DatabaseError> {
    if !is_persisted(patient_id) || get_patient(conn, patient_id)?.is_none() {
        return Err(DatabaseError::Validation(format!(
            "{entity_type} references unknown patient {patient_id}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_doctor_exists(
    conn: &Connection,
    entity_type: &str,
    doctor_id: i64,
) -> Result<(), DatabaseError> {
    if !is_persisted(doctor_id) || get_doctor(conn, doctor_id)?.is_none() {
        return Err(DatabaseError::Validation(format!(
            "{entity_type} references unknown doctor {doctor_id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{save_doctor, save_patient};
    use crate::db::sqlite::open_memory_database;

    fn parties(conn: &Connection) -> (Patient, Doctor) {
        let mut patient = Patient::new("John Doe", "john@example.com", 35, "male");
        let mut doctor = Doctor::new("Dr. Smith", "dr.smith@hospital.com", "Cardiology");
        save_patient(conn, &mut patient).unwrap();
        save_doctor(conn, &mut doctor).unwrap();
        (patient, doctor)
    }

    #[test]
    fn require_returns_both_parties() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let resolved = PartyResolver::new(&conn)
            .require("Appointment", 1, patient.patient_id, doctor.doctor_id)
            .unwrap();
        assert_eq!(resolved, (patient, doctor));
    }

    #[test]
    fn require_names_the_missing_party() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut resolver = PartyResolver::new(&conn);

        match resolver.require("MedicalRecord", 7, 99, doctor.doctor_id) {
            Err(DatabaseError::BrokenReference { entity_type, id, reference }) => {
                assert_eq!(entity_type, "MedicalRecord");
                assert_eq!(id, "7");
                assert_eq!(reference, "Patient 99");
            }
            other => panic!("expected BrokenReference, got {other:?}"),
        }
        match resolver.require("MedicalRecord", 7, patient.patient_id, 42) {
            Err(DatabaseError::BrokenReference { reference, .. }) => {
                assert_eq!(reference, "Doctor 42")
            }
            other => panic!("expected BrokenReference, got {other:?}"),
        }
    }

    #[test]
    fn skip_drops_unresolvable_rows() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut resolver = PartyResolver::new(&conn);
        assert!(resolver
            .resolve_or_skip("Appointment", 1, 99, doctor.doctor_id)
            .unwrap()
            .is_none());
        assert!(resolver
            .resolve_or_skip("Appointment", 2, patient.patient_id, doctor.doctor_id)
            .unwrap()
            .is_some());
    }

    #[test]
    fn seeded_owner_is_served_from_memo() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        let mut resolver = PartyResolver::new(&conn).with_patient(patient.clone());

        conn.execute("DELETE FROM Users WHERE userID = ?1", [patient.user.id])
            .unwrap();
        let (cached, _) = resolver
            .require("Appointment", 1, patient.patient_id, doctor.doctor_id)
            .unwrap();
        assert_eq!(cached, patient);
    }

    #[test]
    fn write_checks_reject_unknown_or_unassigned_parties() {
        let conn = open_memory_database().unwrap();
        let (patient, doctor) = parties(&conn);
        ensure_parties_exist(&conn, "Appointment", patient.patient_id, doctor.doctor_id).unwrap();
        assert!(matches!(
            ensure_parties_exist(&conn, "Appointment", 0, doctor.doctor_id),
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            ensure_doctor_exists(&conn, "Report", patient.patient_id + 10),
            Err(DatabaseError::Validation(_))
        ));
    }
}
