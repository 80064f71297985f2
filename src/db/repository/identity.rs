//! Identity assignment and the User + specialization composite write.
//!
//! Identity 0 means "never persisted": saving such an entity INSERTs and
//! adopts the row id storage hands back; any other value UPDATEs by key.
//! Specializations live in their own tables, keyed by an identity aliased
//! to the owning user's id on first insert.

use rusqlite::{params, Connection, OptionalExtension};
use tracing;

use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::{is_persisted, User};

/// Run `f` atomically on `conn`.
///
/// Opens a transaction when the handle is idle; inside an outer
/// transaction a savepoint scopes the rollback to `f` alone.
pub(crate) fn atomically<T, F>(conn: &Connection, f: F) -> Result<T, DatabaseError>
where
    F: FnOnce(&Connection) -> Result<T, DatabaseError>,
{
    if conn.is_autocommit() {
        let tx = conn.unchecked_transaction()?;
        let value = f(&*tx)?;
        tx.commit()?;
        return Ok(value);
    }

    conn.execute_batch("SAVEPOINT composite_write")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("RELEASE composite_write")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) =
                conn.execute_batch("ROLLBACK TO composite_write; RELEASE composite_write")
            {
                tracing::error!(error = %rollback, "Failed to roll back savepoint");
            }
            Err(e)
        }
    }
}

/// Persist the base user row and return its identity.
///
/// UPDATE never touches `type`: it is fixed once the row exists.
pub(crate) fn write_user_row(conn: &Connection, user: &User) -> Result<i64, DatabaseError> {
    if !is_persisted(user.id) {
        conn.execute(
            "INSERT INTO Users (name, contact, type) VALUES (?1, ?2, ?3)",
            params![user.name, user.contact, user.user_type.as_str()],
        )?;
        return Ok(conn.last_insert_rowid());
    }

    let changed = conn.execute(
        "UPDATE Users SET name = ?1, contact = ?2 WHERE userID = ?3",
        params![user.name, user.contact, user.id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("User", user.id));
    }
    Ok(user.id)
}

/// Stored type of a user row, `None` when the row does not exist.
pub(crate) fn stored_user_type(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<UserType>, DatabaseError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT type FROM Users WHERE userID = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    stored.map(|s| s.parse()).transpose()
}

/// A user extension stored in its own table (Patients, Doctors, ...).
pub(crate) trait Specialization {
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    const KIND: UserType;

    fn user(&self) -> &User;
    fn specialization_id(&self) -> i64;

    /// INSERT the extension row under `id`, linked to `user_id`.
    fn insert_extension(&self, conn: &Connection, id: i64, user_id: i64) -> rusqlite::Result<usize>;

    /// UPDATE the extension row keyed by its own identity.
    fn update_extension(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn assign_ids(&mut self, specialization_id: i64, user_id: i64);
}

/// User an extension row is linked to, `None` when the row does not exist.
fn linked_user<S: Specialization>(
    conn: &Connection,
    specialization_id: i64,
) -> Result<Option<i64>, DatabaseError> {
    let sql = format!("SELECT userID FROM {} WHERE {} = ?1", S::TABLE, S::ID_COLUMN);
    Ok(conn
        .query_row(&sql, params![specialization_id], |row| row.get(0))
        .optional()?)
}

fn partial_write(entity_type: &str, e: rusqlite::Error) -> DatabaseError {
    DatabaseError::PartialWrite {
        entity_type: entity_type.into(),
        reason: e.to_string(),
    }
}

/// Save a specialization and its owning user as one atomic write.
///
/// Identities are written back only after commit, so a rolled-back save
/// leaves the entity exactly as the caller passed it in.
pub(crate) fn save_specialized<S: Specialization>(
    conn: &Connection,
    entity: &mut S,
) -> Result<(), DatabaseError> {
    let user = entity.user();
    if user.user_type != S::KIND {
        return Err(DatabaseError::Validation(format!(
            "{} must be backed by a '{}' user, got '{}'",
            S::ENTITY,
            S::KIND,
            user.user_type
        )));
    }
    if is_persisted(entity.specialization_id()) && !is_persisted(user.id) {
        return Err(DatabaseError::Validation(format!(
            "{} {} has no owning user identity",
            S::ENTITY,
            entity.specialization_id()
        )));
    }

    let outcome = atomically(conn, |conn| {
        let current = &*entity;
        if is_persisted(current.user().id) {
            match stored_user_type(conn, current.user().id)? {
                None => return Err(DatabaseError::not_found("User", current.user().id)),
                Some(kind) if kind != S::KIND => {
                    return Err(DatabaseError::Validation(format!(
                        "user {} is a {kind}, not a {}",
                        current.user().id,
                        S::KIND
                    )))
                }
                Some(_) => {}
            }
        }

        // An extension row is never re-linked to a different user.
        if is_persisted(current.specialization_id()) {
            match linked_user::<S>(conn, current.specialization_id())? {
                None => {
                    return Err(DatabaseError::not_found(S::ENTITY, current.specialization_id()))
                }
                Some(owner) if owner != current.user().id => {
                    return Err(DatabaseError::Validation(format!(
                        "{} {} belongs to user {owner}, not user {}",
                        S::ENTITY,
                        current.specialization_id(),
                        current.user().id
                    )))
                }
                Some(_) => {}
            }
        }

        let user_id = write_user_row(conn, current.user())?;

        let specialization_id = if is_persisted(current.specialization_id()) {
            let changed = current
                .update_extension(conn)
                .map_err(|e| partial_write(S::ENTITY, e))?;
            if changed == 0 {
                return Err(DatabaseError::not_found(S::ENTITY, current.specialization_id()));
            }
            current.specialization_id()
        } else {
            current
                .insert_extension(conn, user_id, user_id)
                .map_err(|e| partial_write(S::ENTITY, e))?;
            user_id
        };

        Ok((specialization_id, user_id))
    });

    match outcome {
        Ok((specialization_id, user_id)) => {
            entity.assign_ids(specialization_id, user_id);
            tracing::info!(
                entity = S::ENTITY,
                id = specialization_id,
                user_id,
                "Saved specialized user"
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(entity = S::ENTITY, error = %e, "Composite write rolled back");
            Err(e)
        }
    }
}

/// Delete a specialization by removing its owning user row.
///
/// The FK cascade removes the extension row and everything keyed on it.
pub(crate) fn delete_specialized<S: Specialization>(
    conn: &Connection,
    specialization_id: i64,
) -> Result<bool, DatabaseError> {
    if !is_persisted(specialization_id) {
        return Ok(false);
    }
    let sql = format!(
        "DELETE FROM Users WHERE userID = (SELECT userID FROM {} WHERE {} = ?1)",
        S::TABLE,
        S::ID_COLUMN
    );
    let deleted = conn.execute(&sql, params![specialization_id])?;
    if deleted > 0 {
        tracing::info!(entity = S::ENTITY, id = specialization_id, "Deleted specialized user");
    }
    Ok(deleted > 0)
}
