use rusqlite::{params, Connection};

use super::identity::{delete_specialized, save_specialized, Specialization};
use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

const SELECT_DOCTOR: &str =
    "SELECT d.doctorID, d.specialization, u.userID, u.name, u.contact
     FROM Doctors d JOIN Users u ON d.userID = u.userID";

impl Specialization for Doctor {
    const ENTITY: &'static str = "Doctor";
    const TABLE: &'static str = "Doctors";
    const ID_COLUMN: &'static str = "doctorID";
    const KIND: UserType = UserType::Doctor;

    fn user(&self) -> &User {
        &self.user
    }

    fn specialization_id(&self) -> i64 {
        self.doctor_id
    }

    fn insert_extension(&self, conn: &Connection, id: i64, user_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO Doctors (doctorID, userID, specialization) VALUES (?1, ?2, ?3)",
            params![id, user_id, self.specialization],
        )
    }

    fn update_extension(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE Doctors SET specialization = ?1 WHERE doctorID = ?2",
            params![self.specialization, self.doctor_id],
        )
    }

    fn assign_ids(&mut self, specialization_id: i64, user_id: i64) {
        self.doctor_id = specialization_id;
        self.user.id = user_id;
    }
}

pub fn save_doctor(conn: &Connection, doctor: &mut Doctor) -> Result<(), DatabaseError> {
    save_specialized(conn, doctor)
}

pub fn get_doctor(conn: &Connection, doctor_id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCTOR} WHERE d.doctorID = ?1 AND u.type = 'doctor'"
    ))?;

    let result = stmt.query_row(params![doctor_id], doctor_from_row);

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_doctor_by_user(conn: &Connection, user_id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCTOR} WHERE d.userID = ?1 AND u.type = 'doctor'"
    ))?;

    let result = stmt.query_row(params![user_id], doctor_from_row);

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_DOCTOR} WHERE u.type = 'doctor' ORDER BY d.doctorID"
    ))?;

    let rows = stmt.query_map([], doctor_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Delete the doctor and its user row; appointments, records,
/// prescriptions and reports go with it.
pub fn delete_doctor(conn: &Connection, doctor_id: i64) -> Result<bool, DatabaseError> {
    delete_specialized::<Doctor>(conn, doctor_id)
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        doctor_id: row.get(0)?,
        specialization: row.get(1)?,
        user: User {
            id: row.get(2)?,
            name: row.get(3)?,
            contact: row.get(4)?,
            user_type: UserType::Doctor,
        },
    })
}
