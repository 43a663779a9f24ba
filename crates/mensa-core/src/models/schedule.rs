//! Weekly meal schedule model.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MensaError, MensaResult};
use crate::models::meal::MealType;

/// One serving window: a meal served on a given weekday between
/// `start_time` and `end_time`, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub meal_type: MealType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleEntry {
    pub day_of_week: u8,
    pub meal_type: MealType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl CreateScheduleEntry {
    pub fn validate(&self) -> MensaResult<()> {
        if self.day_of_week > 6 {
            return Err(MensaError::Validation {
                message: format!("day_of_week must be 0..=6, got {}", self.day_of_week),
            });
        }
        if self.start_time >= self.end_time {
            return Err(MensaError::Validation {
                message: format!(
                    "start_time {} must precede end_time {}",
                    self.start_time, self.end_time
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScheduleEntry {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}
