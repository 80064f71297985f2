use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::user::{Doctor, Patient};
use super::UNASSIGNED_ID;

/// A booked visit, carrying owned copies of its patient and doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient: Patient,
    pub doctor: Doctor,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Set by storage on insert.
    pub created_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn new(patient: Patient, doctor: Doctor, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            id: UNASSIGNED_ID,
            patient,
            doctor,
            date,
            time,
            status: AppointmentStatus::default(),
            notes: None,
            created_at: None,
        }
    }
}
