use rusqlite::{params, Connection};

use super::identity::{delete_specialized, save_specialized, Specialization};
use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

const SELECT_PATIENT: &str =
    "SELECT p.patientID, p.age, p.gender, u.userID, u.name, u.contact
     FROM Patients p JOIN Users u ON p.userID = u.userID";

impl Specialization for Patient {
    const ENTITY: &'static str = "Patient";
    const TABLE: &'static str = "Patients";
    const ID_COLUMN: &'static str = "patientID";
    const KIND: UserType = UserType::Patient;

    fn user(&self) -> &User {
        &self.user
    }

    fn specialization_id(&self) -> i64 {
        self.patient_id
    }

    fn insert_extension(&self, conn: &Connection, id: i64, user_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO Patients (patientID, userID, age, gender) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, self.age, self.gender],
        )
    }

    fn update_extension(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE Patients SET age = ?1, gender = ?2 WHERE patientID = ?3",
            params![self.age, self.gender, self.patient_id],
        )
    }

    fn assign_ids(&mut self, specialization_id: i64, user_id: i64) {
        self.patient_id = specialization_id;
        self.user.id = user_id;
    }
}

/// Save the patient and its user row in one transaction.
pub fn save_patient(conn: &Connection, patient: &mut Patient) -> Result<(), DatabaseError> {
    save_specialized(conn, patient)
}

/// Found only when both the Patients row and a `type = 'patient'` user exist.
pub fn get_patient(conn: &Connection, patient_id: i64) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PATIENT} WHERE p.patientID = ?1 AND u.type = 'patient'"
    ))?;

    let result = stmt.query_row(params![patient_id], patient_from_row);

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_patient_by_user(conn: &Connection, user_id: i64) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PATIENT} WHERE p.userID = ?1 AND u.type = 'patient'"
    ))?;

    let result = stmt.query_row(params![user_id], patient_from_row);

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Patients whose user row is still typed 'patient'.
pub fn get_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_PATIENT} WHERE u.type = 'patient' ORDER BY p.patientID"
    ))?;

    let rows = stmt.query_map([], patient_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Delete the patient together with its user row.
pub fn delete_patient(conn: &Connection, patient_id: i64) -> Result<bool, DatabaseError> {
    delete_specialized::<Patient>(conn, patient_id)
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        patient_id: row.get(0)?,
        age: row.get(1)?,
        gender: row.get(2)?,
        user: User {
            id: row.get(3)?,
            name: row.get(4)?,
            contact: row.get(5)?,
            user_type: UserType::Patient,
        },
    })
}
