//! Access decision types.
//!
//! Every scan resolves to exactly one of these outcomes, and each
//! denial reason keeps its own operator message and cue: cafeteria
//! staff react differently to a duplicate scan (explain to the
//! student) than to a blocked one (escalate to management), so the
//! reasons must never collapse into one generic message.

use mensa_core::models::meal::MealType;
use mensa_core::models::student::Student;
use serde::Serialize;

/// Why a scan was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No meal window is open at scan time.
    OutOfHours,
    /// The token does not resolve to any student.
    UnknownStudent,
    /// An active denial covers this student, meal, and date, or the
    /// student account is not active.
    Blocked,
    /// A meal record for this (student, meal, date) already exists.
    Duplicate,
    /// A persistence read failed or timed out. Not a business denial.
    Internal,
}

/// Operator terminal cue accompanying a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Success,
    Reject,
    Warning,
}

impl DenyReason {
    pub fn operator_message(&self) -> &'static str {
        match self {
            DenyReason::OutOfHours => "No meal is being served right now.",
            DenyReason::UnknownStudent => "Card not recognized. Student not found.",
            DenyReason::Blocked => "Access blocked. Please refer the student to management.",
            DenyReason::Duplicate => "Already checked in for this meal today.",
            DenyReason::Internal => "Verification failed due to a system error. Try again.",
        }
    }

    pub fn cue(&self) -> Cue {
        match self {
            DenyReason::OutOfHours | DenyReason::Duplicate | DenyReason::Internal => Cue::Warning,
            DenyReason::UnknownStudent | DenyReason::Blocked => Cue::Reject,
        }
    }
}

/// Result of the decision sequence, before any write.
#[derive(Debug, Clone)]
pub enum Decision {
    Allow {
        student: Student,
        meal_type: MealType,
    },
    Deny {
        reason: DenyReason,
    },
}

impl Decision {
    pub fn deny(reason: DenyReason) -> Self {
        Decision::Deny { reason }
    }
}
