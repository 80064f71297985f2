use rusqlite::{params, Connection};

use super::identity::{delete_specialized, save_specialized, Specialization};
use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

const SELECT_ADMIN: &str =
    "SELECT a.adminID, u.userID, u.name, u.contact
     FROM Admins a JOIN Users u ON a.userID = u.userID";

impl Specialization for Admin {
    const ENTITY: &'static str = "Admin";
    const TABLE: &'static str = "Admins";
    const ID_COLUMN: &'static str = "adminID";
    const KIND: UserType = UserType::Admin;

    fn user(&self) -> &User {
        &self.user
    }

    fn specialization_id(&self) -> i64 {
        self.admin_id
    }

    fn insert_extension(&self, conn: &Connection, id: i64, user_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO Admins (adminID, userID) VALUES (?1, ?2)",
            params![id, user_id],
        )
    }

    // No extra columns to write; only confirm the linked row is still there.
    fn update_extension(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.query_row(
            "SELECT COUNT(*) FROM Admins WHERE adminID = ?1 AND userID = ?2",
            params![self.admin_id, self.user.id],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
    }

    fn assign_ids(&mut self, specialization_id: i64, user_id: i64) {
        self.admin_id = specialization_id;
        self.user.id = user_id;
    }
}

pub fn save_admin(conn: &Connection, admin: &mut Admin) -> Result<(), DatabaseError> {
    save_specialized(conn, admin)
}

pub fn get_admin(conn: &Connection, admin_id: i64) -> Result<Option<Admin>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ADMIN} WHERE a.adminID = ?1 AND u.type = 'admin'"
    ))?;

    let result = stmt.query_row(params![admin_id], admin_from_row);

    match result {
        Ok(admin) => Ok(Some(admin)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_admin_by_user(conn: &Connection, user_id: i64) -> Result<Option<Admin>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ADMIN} WHERE a.userID = ?1 AND u.type = 'admin'"
    ))?;

    let result = stmt.query_row(params![user_id], admin_from_row);

    match result {
        Ok(admin) => Ok(Some(admin)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_admins(conn: &Connection) -> Result<Vec<Admin>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ADMIN} WHERE u.type = 'admin' ORDER BY a.adminID"
    ))?;

    let rows = stmt.query_map([], admin_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_admin(conn: &Connection, admin_id: i64) -> Result<bool, DatabaseError> {
    delete_specialized::<Admin>(conn, admin_id)
}

fn admin_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        admin_id: row.get(0)?,
        user: User {
            id: row.get(1)?,
            name: row.get(2)?,
            contact: row.get(3)?,
            user_type: UserType::Admin,
        },
    })
}
