use rusqlite::{params, Connection};

use super::identity::{delete_specialized, save_specialized, Specialization};
use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

const SELECT_RECEPTIONIST: &str =
    "SELECT r.receptionistID, u.userID, u.name, u.contact
     FROM Receptionists r JOIN Users u ON r.userID = u.userID";

impl Specialization for Receptionist {
    const ENTITY: &'static str = "Receptionist";
    const TABLE: &'static str = "Receptionists";
    const ID_COLUMN: &'static str = "receptionistID";
    const KIND: UserType = UserType::Receptionist;

    fn user(&self) -> &User {
        &self.user
    }

    fn specialization_id(&self) -> i64 {
        self.receptionist_id
    }

    fn insert_extension(&self, conn: &Connection, id: i64, user_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO Receptionists (receptionistID, userID) VALUES (?1, ?2)",
            params![id, user_id],
        )
    }

    // No extra columns to write; only confirm the linked row is still there.
    fn update_extension(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.query_row(
            "SELECT COUNT(*) FROM Receptionists WHERE receptionistID = ?1 AND userID = ?2",
            params![self.receptionist_id, self.user.id],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
    }

    fn assign_ids(&mut self, specialization_id: i64, user_id: i64) {
        self.receptionist_id = specialization_id;
        self.user.id = user_id;
    }
}

pub fn save_receptionist(
    conn: &Connection,
    receptionist: &mut Receptionist,
) -> Result<(), DatabaseError> {
    save_specialized(conn, receptionist)
}

pub fn get_receptionist(
    conn: &Connection,
    receptionist_id: i64,
) -> Result<Option<Receptionist>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RECEPTIONIST} WHERE r.receptionistID = ?1 AND u.type = 'receptionist'"
    ))?;

    let result = stmt.query_row(params![receptionist_id], receptionist_from_row);

    match result {
        Ok(receptionist) => Ok(Some(receptionist)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_receptionist_by_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<Receptionist>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RECEPTIONIST} WHERE r.userID = ?1 AND u.type = 'receptionist'"
    ))?;

    let result = stmt.query_row(params![user_id], receptionist_from_row);

    match result {
        Ok(receptionist) => Ok(Some(receptionist)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_receptionists(conn: &Connection) -> Result<Vec<Receptionist>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RECEPTIONIST} WHERE u.type = 'receptionist' ORDER BY r.receptionistID"
    ))?;

    let rows = stmt.query_map([], receptionist_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_receptionist(conn: &Connection, receptionist_id: i64) -> Result<bool, DatabaseError> {
    delete_specialized::<Receptionist>(conn, receptionist_id)
}

fn receptionist_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Receptionist> {
    Ok(Receptionist {
        receptionist_id: row.get(0)?,
        user: User {
            id: row.get(1)?,
            name: row.get(2)?,
            contact: row.get(3)?,
            user_type: UserType::Receptionist,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{count_users, get_user};
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn save_and_find_receptionist() {
        let conn = open_memory_database().unwrap();
        let mut receptionist = Receptionist::new("Receptionist 1", "reception@hospital.com");
        save_receptionist(&conn, &mut receptionist).unwrap();

        assert_eq!(receptionist.receptionist_id, receptionist.user.id);
        let loaded = get_receptionist(&conn, receptionist.receptionist_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, receptionist);
        assert_eq!(get_all_receptionists(&conn).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_single_row_pair() {
        let conn = open_memory_database().unwrap();
        let mut receptionist = Receptionist::new("Front", "front@x");
        save_receptionist(&conn, &mut receptionist).unwrap();
        receptionist.user.name = "Front Desk".into();
        save_receptionist(&conn, &mut receptionist).unwrap();

        let all = get_all_receptionists(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user.name, "Front Desk");
    }

    #[test]
    fn failed_extension_insert_rolls_back_user_row() {
        let conn = open_memory_database().unwrap();
        let mut first = Receptionist::new("Front", "front@x");
        save_receptionist(&conn, &mut first).unwrap();

        conn.execute_batch(
            "PRAGMA foreign_keys=OFF;
             INSERT INTO Receptionists (receptionistID, userID) VALUES (2, 999);
             PRAGMA foreign_keys=ON;",
        )
        .unwrap();

        let mut second = Receptionist::new("Back", "back@x");
        let err = save_receptionist(&conn, &mut second).unwrap_err();

        assert!(matches!(err, DatabaseError::PartialWrite { .. }));
        assert_eq!(second.receptionist_id, UNASSIGNED_ID);
        assert_eq!(second.user.id, UNASSIGNED_ID);
        assert_eq!(count_users(&conn).unwrap(), 1);
        assert!(get_user(&conn, 2).unwrap().is_none());
    }

    #[test]
    fn receptionist_row_stays_with_its_user() {
        let conn = open_memory_database().unwrap();
        let mut front = Receptionist::new("Front", "front@x");
        let mut back = Receptionist::new("Back", "back@x");
        save_receptionist(&conn, &mut front).unwrap();
        save_receptionist(&conn, &mut back).unwrap();

        let mut forged = Receptionist {
            receptionist_id: front.receptionist_id,
            user: back.user.clone(),
        };
        let err = save_receptionist(&conn, &mut forged).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(
            get_receptionist_by_user(&conn, front.user.id).unwrap().unwrap(),
            front
        );
        assert_eq!(
            get_receptionist_by_user(&conn, back.user.id).unwrap().unwrap(),
            back
        );
    }

    #[test]
    fn delete_receptionist_removes_user() {
        let conn = open_memory_database().unwrap();
        let mut receptionist = Receptionist::new("Temp", "temp@x");
        save_receptionist(&conn, &mut receptionist).unwrap();
        assert!(delete_receptionist(&conn, receptionist.receptionist_id).unwrap());
        assert!(get_receptionist_by_user(&conn, receptionist.user.id).unwrap().is_none());
    }
}
