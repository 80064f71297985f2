use serde::{Deserialize, Serialize};

use super::enums::UserType;
use super::UNASSIGNED_ID;
use crate::db::DatabaseError;

/// Base record shared by every kind of hospital user.
///
/// `user_type` is fixed at creation and selects the specialization table
/// that holds the matching extension row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub user_type: UserType,
}

impl User {
    pub fn new(name: impl Into<String>, contact: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: UNASSIGNED_ID,
            name: name.into(),
            contact: contact.into(),
            user_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub user: User,
    pub age: u32,
    pub gender: String,
}

impl Patient {
    pub fn new(
        name: impl Into<String>,
        contact: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: UNASSIGNED_ID,
            user: User::new(name, contact, UserType::Patient),
            age,
            gender: gender.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: i64,
    pub user: User,
    pub specialization: String,
}

impl Doctor {
    pub fn new(
        name: impl Into<String>,
        contact: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            doctor_id: UNASSIGNED_ID,
            user: User::new(name, contact, UserType::Doctor),
            specialization: specialization.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptionist {
    pub receptionist_id: i64,
    pub user: User,
}

impl Receptionist {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            receptionist_id: UNASSIGNED_ID,
            user: User::new(name, contact, UserType::Receptionist),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub admin_id: i64,
    pub user: User,
}

impl Admin {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            admin_id: UNASSIGNED_ID,
            user: User::new(name, contact, UserType::Admin),
        }
    }
}

/// A user resolved to its specialization through the stored type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Member {
    Patient(Patient),
    Doctor(Doctor),
    Receptionist(Receptionist),
    Admin(Admin),
}

impl Member {
    pub fn user(&self) -> &User {
        match self {
            Member::Patient(p) => &p.user,
            Member::Doctor(d) => &d.user,
            Member::Receptionist(r) => &r.user,
            Member::Admin(a) => &a.user,
        }
    }

    pub fn user_type(&self) -> UserType {
        self.user().user_type
    }
}

/// Administrative mutation applied to a bare user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum UserAction {
    Delete,
    UpdateName(String),
    UpdateContact(String),
}

impl UserAction {
    /// Build an action from its wire name (`delete`, `update_name`,
    /// `update_contact`) and value. The value is ignored for `delete`.
    pub fn from_parts(action: &str, value: &str) -> Result<Self, DatabaseError> {
        match action {
            "delete" => Ok(Self::Delete),
            "update_name" => Ok(Self::UpdateName(value.to_owned())),
            "update_contact" => Ok(Self::UpdateContact(value.to_owned())),
            other => Err(DatabaseError::Validation(format!(
                "Invalid management action: {other}"
            ))),
        }
    }
}
