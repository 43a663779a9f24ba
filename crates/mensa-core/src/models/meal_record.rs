//! Meal record - the persisted fact that a student consumed a meal on
//! a given date. At most one record may exist per
//! (student_id, meal_type, meal_date); the storage layer enforces this
//! with a unique index.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::meal::MealType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: Uuid,
    pub student_id: String,
    pub meal_type: MealType,
    pub meal_date: NaiveDate,
    pub consumed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMealRecord {
    pub student_id: String,
    pub meal_type: MealType,
    pub meal_date: NaiveDate,
    pub consumed_at: DateTime<Utc>,
}
