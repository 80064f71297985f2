use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::UNASSIGNED_ID;

/// Write-only: no repository read path exists for prescriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub medicine: String,
    pub dosage: String,
    pub date: NaiveDate,
}

impl Prescription {
    pub fn new(
        doctor_id: i64,
        patient_id: i64,
        medicine: impl Into<String>,
        dosage: impl Into<String>,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            doctor_id,
            patient_id,
            medicine: medicine.into(),
            dosage: dosage.into(),
            date: Local::now().date_naive(),
        }
    }
}
