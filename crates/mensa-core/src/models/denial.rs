//! Denial model - a time-bounded, meal-scoped restriction preventing a
//! student from being recorded as having eaten.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::meal::MealType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Denial {
    pub id: Uuid,
    pub student_id: String,
    pub start_date: NaiveDate,
    /// Open-ended when absent.
    pub end_date: Option<NaiveDate>,
    pub meal_types: Vec<MealType>,
    pub is_active: bool,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Denial {
    /// Whether this denial applies to meal `meal` on date `date`.
    ///
    /// Active iff the denial is active, `start_date <= date`, the date
    /// is on or before `end_date` (no upper bound when open-ended), and
    /// the meal is in scope.
    pub fn applies_to(&self, date: NaiveDate, meal: MealType) -> bool {
        if !self.is_active {
            return false;
        }
        if date < self.start_date {
            return false;
        }
        if let Some(end) = self.end_date
            && date > end
        {
            return false;
        }
        self.meal_types.contains(&meal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDenial {
    pub student_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub meal_types: Vec<MealType>,
    pub reason: String,
}
