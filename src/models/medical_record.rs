use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::user::{Doctor, Patient};
use super::UNASSIGNED_ID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub patient: Patient,
    pub doctor: Doctor,
    pub diagnosis: String,
    pub treatment: String,
    pub date: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
}

impl MedicalRecord {
    /// New record dated today (local calendar).
    pub fn new(
        patient: Patient,
        doctor: Doctor,
        diagnosis: impl Into<String>,
        treatment: impl Into<String>,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            patient,
            doctor,
            diagnosis: diagnosis.into(),
            treatment: treatment.into(),
            date: Local::now().date_naive(),
            created_at: None,
        }
    }
}
