pub mod appointment;
pub mod enums;
pub mod medical_record;
pub mod prescription;
pub mod report;
pub mod user;

pub use appointment::*;
pub use medical_record::*;
pub use prescription::*;
pub use report::*;
pub use user::*;

/// Identity value of an entity that has never been persisted.
pub const UNASSIGNED_ID: i64 = 0;

/// True once storage has assigned an identity.
pub fn is_persisted(id: i64) -> bool {
    id != UNASSIGNED_ID
}
