use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::UNASSIGNED_ID;

/// Flat row: the doctor is kept as a raw identity and never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub doctor_id: i64,
    pub details: String,
    pub created_at: Option<NaiveDateTime>,
}

impl Report {
    pub fn new(doctor_id: i64, details: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            doctor_id,
            details: details.into(),
            created_at: None,
        }
    }
}
