//! Scan token parsing and QR payload generation.
//!
//! The registration flow embeds a JSON payload in each printed QR
//! code; older cards carry a bare student id. One parsing function
//! accepts both, with a defined fallback order: structured JSON first,
//! then the trimmed raw string as a student id.

use chrono::{DateTime, Utc};
use mensa_core::models::student::Student;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Payload type marker embedded in every meal-card QR code.
pub const MEAL_CARD_TYPE: &str = "meal_card";

/// The JSON document embedded in a printed QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl QrPayload {
    /// Build the payload the print flow embeds for a student.
    pub fn for_student(student: &Student, issued_at: DateTime<Utc>) -> Self {
        Self {
            student_id: student.student_id.clone(),
            name: student.full_name(),
            kind: MEAL_CARD_TYPE.into(),
            timestamp: issued_at,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A parsed identity token from either scanning surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanToken {
    /// Structured meal-card payload.
    Structured {
        student_id: String,
        name: String,
        issued_at: DateTime<Utc>,
    },
    /// Bare student id (legacy cards, manual entry).
    RawId(String),
}

impl ScanToken {
    /// The student id this token claims, regardless of form.
    pub fn student_id(&self) -> &str {
        match self {
            ScanToken::Structured { student_id, .. } => student_id,
            ScanToken::RawId(id) => id,
        }
    }
}

/// Parse a raw decoded scan into a [`ScanToken`].
///
/// A JSON object with the `meal_card` type marker yields
/// [`ScanToken::Structured`]; anything else that is non-empty falls
/// back to [`ScanToken::RawId`]. Whitespace-only input is rejected.
pub fn parse_scan_token(raw: &str) -> Result<ScanToken, VerifyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VerifyError::InvalidToken("empty token".into()));
    }

    if let Ok(payload) = serde_json::from_str::<QrPayload>(trimmed)
        && payload.kind == MEAL_CARD_TYPE
        && !payload.student_id.trim().is_empty()
    {
        return Ok(ScanToken::Structured {
            student_id: payload.student_id.trim().to_string(),
            name: payload.name,
            issued_at: payload.timestamp,
        });
    }

    Ok(ScanToken::RawId(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_payload_is_parsed() {
        let raw = r#"{"studentId":"S100","name":"Ada Lovelace","type":"meal_card","timestamp":"2026-03-02T08:00:00Z"}"#;
        let token = parse_scan_token(raw).unwrap();
        match token {
            ScanToken::Structured {
                student_id, name, ..
            } => {
                assert_eq!(student_id, "S100");
                assert_eq!(name, "Ada Lovelace");
            }
            other => panic!("expected structured token, got {other:?}"),
        }
    }

    #[test]
    fn bare_id_falls_back_to_raw() {
        let token = parse_scan_token("  S100 \n").unwrap();
        assert_eq!(token, ScanToken::RawId("S100".into()));
        assert_eq!(token.student_id(), "S100");
    }

    #[test]
    fn json_without_meal_card_marker_is_treated_as_raw() {
        let raw = r#"{"studentId":"S100","name":"Ada","type":"library_card","timestamp":"2026-03-02T08:00:00Z"}"#;
        let token = parse_scan_token(raw).unwrap();
        assert!(matches!(token, ScanToken::RawId(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(parse_scan_token("").is_err());
        assert!(parse_scan_token("   \t").is_err());
    }

    #[test]
    fn payload_roundtrips_through_parse() {
        let student = Student {
            id: uuid::Uuid::new_v4(),
            student_id: "S42".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            department: "CS".into(),
            enrollment_year: 2025,
            status: mensa_core::models::student::StudentStatus::Active,
            rfid_uid: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let payload = QrPayload::for_student(&student, Utc::now());
        let json = payload.to_json().unwrap();

        let token = parse_scan_token(&json).unwrap();
        assert_eq!(token.student_id(), "S42");
    }
}
