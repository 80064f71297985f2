use std::str::FromStr;

use rusqlite::{params, Connection};
use tracing;

use super::identity::write_user_row;
use super::{get_admin_by_user, get_doctor_by_user, get_patient_by_user, get_receptionist_by_user};
use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

/// Save a bare user row (no specialization).
pub fn save_user(conn: &Connection, user: &mut User) -> Result<(), DatabaseError> {
    let id = write_user_row(conn, user)?;
    if !is_persisted(user.id) {
        tracing::info!(user_id = id, user_type = %user.user_type, "Created user");
    }
    user.id = id;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT userID, name, contact, type FROM Users WHERE userID = ?1",
    )?;

    let result = stmt.query_row(params![user_id], user_row);

    match result {
        Ok(row) => Ok(Some(row_to_user(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT userID, name, contact, type FROM Users ORDER BY userID",
    )?;

    let rows = stmt.query_map([], user_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user(row?)?);
    }
    Ok(users)
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM Users", [], |row| row.get(0))?;
    Ok(count)
}

/// Delete a user; the cascade removes its specialization and dependents.
pub fn delete_user(conn: &Connection, user_id: i64) -> Result<bool, DatabaseError> {
    if !is_persisted(user_id) {
        return Ok(false);
    }
    let deleted = conn.execute("DELETE FROM Users WHERE userID = ?1", params![user_id])?;
    if deleted > 0 {
        tracing::info!(user_id, "Deleted user");
    }
    Ok(deleted > 0)
}

/// Apply an administrative action. `Ok(false)` when no such user exists.
pub fn manage_user(
    conn: &Connection,
    user_id: i64,
    action: &UserAction,
) -> Result<bool, DatabaseError> {
    let changed = match action {
        UserAction::Delete => return delete_user(conn, user_id),
        UserAction::UpdateName(name) => conn.execute(
            "UPDATE Users SET name = ?1 WHERE userID = ?2",
            params![name, user_id],
        )?,
        UserAction::UpdateContact(contact) => conn.execute(
            "UPDATE Users SET contact = ?1 WHERE userID = ?2",
            params![contact, user_id],
        )?,
    };
    Ok(changed > 0)
}

/// Load a user together with its specialization, chosen by the stored type.
pub fn get_member(conn: &Connection, user_id: i64) -> Result<Option<Member>, DatabaseError> {
    let Some(user) = get_user(conn, user_id)? else {
        return Ok(None);
    };

    let member = match user.user_type {
        UserType::Patient => get_patient_by_user(conn, user_id)?.map(Member::Patient),
        UserType::Doctor => get_doctor_by_user(conn, user_id)?.map(Member::Doctor),
        UserType::Receptionist => {
            get_receptionist_by_user(conn, user_id)?.map(Member::Receptionist)
        }
        UserType::Admin => get_admin_by_user(conn, user_id)?.map(Member::Admin),
    };

    if member.is_none() {
        tracing::debug!(user_id, user_type = %user.user_type, "User has no specialization row");
    }
    Ok(member)
}

type UserRow = (i64, String, String, String);

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn row_to_user((id, name, contact, user_type): UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id,
        name,
        contact,
        user_type: UserType::from_str(&user_type)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    #[test]
    fn save_assigns_positive_identity() {
        let conn = test_db();
        let mut user = User::new("John Doe", "john@example.com", UserType::Patient);
        save_user(&conn, &mut user).unwrap();
        assert!(user.id > 0);
    }

    #[test]
    fn second_save_updates_instead_of_inserting() {
        let conn = test_db();
        let mut user = User::new("John Doe", "john@example.com", UserType::Patient);
        save_user(&conn, &mut user).unwrap();
        let id = user.id;

        user.name = "John Q. Doe".into();
        save_user(&conn, &mut user).unwrap();

        assert_eq!(user.id, id);
        assert_eq!(count_users(&conn).unwrap(), 1);
        assert_eq!(get_user(&conn, id).unwrap().unwrap().name, "John Q. Doe");
    }

    #[test]
    fn round_trip_preserves_fields_for_every_type() {
        let conn = test_db();
        for (i, kind) in [
            UserType::Patient,
            UserType::Doctor,
            UserType::Receptionist,
            UserType::Admin,
        ]
        .into_iter()
        .enumerate()
        {
            let mut user = User::new(format!("User {i}"), format!("u{i}@example.com"), kind);
            save_user(&conn, &mut user).unwrap();
            let loaded = get_user(&conn, user.id).unwrap().unwrap();
            assert_eq!(loaded, user);
        }
    }

    #[test]
    fn update_never_changes_stored_type() {
        let conn = test_db();
        let mut user = User::new("Dr. Smith", "smith@hospital.com", UserType::Doctor);
        save_user(&conn, &mut user).unwrap();

        user.user_type = UserType::Admin;
        save_user(&conn, &mut user).unwrap();

        let loaded = get_user(&conn, user.id).unwrap().unwrap();
        assert_eq!(loaded.user_type, UserType::Doctor);
    }

    #[test]
    fn update_of_missing_row_is_not_found() {
        let conn = test_db();
        let mut user = User::new("Ghost", "ghost@example.com", UserType::Admin);
        user.id = 99;
        let err = save_user(&conn, &mut user).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert_eq!(count_users(&conn).unwrap(), 0);
    }

    #[test]
    fn missing_user_is_none() {
        let conn = test_db();
        assert!(get_user(&conn, 7).unwrap().is_none());
    }

    #[test]
    fn get_all_users_lists_in_id_order() {
        let conn = test_db();
        let mut a = User::new("A", "a@x", UserType::Admin);
        let mut b = User::new("B", "b@x", UserType::Doctor);
        save_user(&conn, &mut a).unwrap();
        save_user(&conn, &mut b).unwrap();
        let all = get_all_users(&conn).unwrap();
        assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[test]
    fn delete_sentinel_is_false() {
        let conn = test_db();
        assert!(!delete_user(&conn, UNASSIGNED_ID).unwrap());
    }

    #[test]
    fn manage_user_actions() {
        let conn = test_db();
        let mut user = User::new("Receptionist 1", "reception@hospital.com", UserType::Receptionist);
        save_user(&conn, &mut user).unwrap();

        assert!(manage_user(&conn, user.id, &UserAction::UpdateName("Front Desk".into())).unwrap());
        assert!(manage_user(&conn, user.id, &UserAction::UpdateContact("desk@hospital.com".into())).unwrap());
        let loaded = get_user(&conn, user.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Front Desk");
        assert_eq!(loaded.contact, "desk@hospital.com");

        assert!(manage_user(&conn, user.id, &UserAction::Delete).unwrap());
        assert!(get_user(&conn, user.id).unwrap().is_none());
        assert!(!manage_user(&conn, user.id, &UserAction::UpdateName("x".into())).unwrap());
    }

    #[test]
    fn bare_user_has_no_member() {
        let conn = test_db();
        let mut user = User::new("Loose", "loose@x", UserType::Patient);
        save_user(&conn, &mut user).unwrap();
        assert!(get_member(&conn, user.id).unwrap().is_none());
    }
}
