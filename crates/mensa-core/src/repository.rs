//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups that can legitimately
//! miss during verification (`find`) return `Option`; keyed getters
//! return `MensaError::NotFound` when absent.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::MensaResult;
use crate::models::{
    denial::{CreateDenial, Denial},
    meal::MealType,
    meal_record::{CreateMealRecord, MealRecord},
    schedule::{CreateScheduleEntry, ScheduleEntry, UpdateScheduleEntry},
    student::{CreateStudent, Student, UpdateStudent},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait StudentRepository: Send + Sync {
    fn create(&self, input: CreateStudent) -> impl Future<Output = MensaResult<Student>> + Send;
    fn get_by_student_id(
        &self,
        student_id: &str,
    ) -> impl Future<Output = MensaResult<Student>> + Send;
    fn get_by_rfid(&self, rfid_uid: &str) -> impl Future<Output = MensaResult<Student>> + Send;
    fn update(
        &self,
        student_id: &str,
        input: UpdateStudent,
    ) -> impl Future<Output = MensaResult<Student>> + Send;
    /// Soft-delete: sets status to Inactive. Students are never hard-deleted.
    fn deactivate(&self, student_id: &str) -> impl Future<Output = MensaResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MensaResult<PaginatedResult<Student>>> + Send;
}

pub trait ScheduleRepository: Send + Sync {
    fn create(
        &self,
        input: CreateScheduleEntry,
    ) -> impl Future<Output = MensaResult<ScheduleEntry>> + Send;
    /// Active entries for a weekday (0 = Sunday), ordered by ascending
    /// `start_time` so overlapping windows resolve deterministically.
    fn list_active_for_day(
        &self,
        day_of_week: u8,
    ) -> impl Future<Output = MensaResult<Vec<ScheduleEntry>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateScheduleEntry,
    ) -> impl Future<Output = MensaResult<ScheduleEntry>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MensaResult<()>> + Send;
    fn list(&self) -> impl Future<Output = MensaResult<Vec<ScheduleEntry>>> + Send;
}

pub trait DenialRepository: Send + Sync {
    fn create(&self, input: CreateDenial) -> impl Future<Output = MensaResult<Denial>> + Send;
    /// Active denial entries for the student; date/meal scoping is
    /// evaluated by the caller via [`Denial::applies_to`].
    fn list_active_for_student(
        &self,
        student_id: &str,
    ) -> impl Future<Output = MensaResult<Vec<Denial>>> + Send;
    fn deactivate(&self, id: Uuid) -> impl Future<Output = MensaResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MensaResult<PaginatedResult<Denial>>> + Send;
}

pub trait MealRecordRepository: Send + Sync {
    /// Insert one meal record. Returns [`crate::error::MensaError::AlreadyExists`]
    /// when a record for the same (student, meal, date) is already
    /// present; that conflict is the authoritative duplicate signal.
    fn insert(
        &self,
        input: CreateMealRecord,
    ) -> impl Future<Output = MensaResult<MealRecord>> + Send;
    fn find(
        &self,
        student_id: &str,
        meal_type: MealType,
        meal_date: NaiveDate,
    ) -> impl Future<Output = MensaResult<Option<MealRecord>>> + Send;
    fn list_for_date(
        &self,
        meal_date: NaiveDate,
    ) -> impl Future<Output = MensaResult<Vec<MealRecord>>> + Send;
}
