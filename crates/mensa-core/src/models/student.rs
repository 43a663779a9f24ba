//! Student domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StudentStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    /// External registration number. Immutable and unique; this is the
    /// key embedded in QR payloads, never the record id.
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub enrollment_year: i32,
    pub status: StudentStatus,
    /// RFID tag UID, if a card has been paired.
    pub rfid_uid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudent {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub enrollment_year: i32,
    pub rfid_uid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateStudent {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub enrollment_year: Option<i32>,
    pub status: Option<StudentStatus>,
    /// `Some(Some(uid))` = pair, `Some(None)` = unpair, `None` = no change.
    pub rfid_uid: Option<Option<String>>,
}
