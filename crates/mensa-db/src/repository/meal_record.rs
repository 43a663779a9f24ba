//! SurrealDB implementation of [`MealRecordRepository`].
//!
//! `insert` is the single point of state mutation in the verification
//! flow. The `idx_meal_record_unique` index makes the insert itself
//! the duplicate check of record: a conflicting write comes back as
//! `MensaError::AlreadyExists`, which the decision engine reports as
//! a duplicate scan.

use chrono::{DateTime, NaiveDate, Utc};
use mensa_core::error::MensaResult;
use mensa_core::models::meal::MealType;
use mensa_core::models::meal_record::{CreateMealRecord, MealRecord};
use mensa_core::repository::MealRecordRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::student::conflict_or_migration;

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Debug, SurrealValue)]
struct MealRecordRow {
    student_id: String,
    meal_type: String,
    meal_date: String,
    consumed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MealRecordRowWithId {
    record_id: String,
    student_id: String,
    meal_type: String,
    meal_date: String,
    consumed_at: DateTime<Utc>,
}

fn parse_meal(s: &str) -> Result<MealType, DbError> {
    MealType::parse(s).ok_or_else(|| DbError::Migration(format!("unknown meal type: {s}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DbError::Migration(format!("invalid date '{s}': {e}")))
}

impl MealRecordRow {
    fn into_record(self, id: Uuid) -> Result<MealRecord, DbError> {
        Ok(MealRecord {
            id,
            student_id: self.student_id,
            meal_type: parse_meal(&self.meal_type)?,
            meal_date: parse_date(&self.meal_date)?,
            consumed_at: self.consumed_at,
        })
    }
}

impl MealRecordRowWithId {
    fn try_into_record(self) -> Result<MealRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(MealRecord {
            id,
            student_id: self.student_id,
            meal_type: parse_meal(&self.meal_type)?,
            meal_date: parse_date(&self.meal_date)?,
            consumed_at: self.consumed_at,
        })
    }
}

/// SurrealDB implementation of the MealRecord repository.
#[derive(Clone)]
pub struct SurrealMealRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMealRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MealRecordRepository for SurrealMealRecordRepository<C> {
    async fn insert(&self, input: CreateMealRecord) -> MensaResult<MealRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('meal_record', $id) SET \
                 student_id = $student_id, \
                 meal_type = $meal_type, \
                 meal_date = $meal_date, \
                 consumed_at = $consumed_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("student_id", input.student_id))
            .bind(("meal_type", input.meal_type.as_str().to_string()))
            .bind(("meal_date", input.meal_date.format(DATE_FMT).to_string()))
            .bind(("consumed_at", input.consumed_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| conflict_or_migration(e, "meal_record"))?;

        let rows: Vec<MealRecordRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "meal_record".into(),
            key: id_str,
        })?;

        row.into_record(id).map_err(Into::into)
    }

    async fn find(
        &self,
        student_id: &str,
        meal_type: MealType,
        meal_date: NaiveDate,
    ) -> MensaResult<Option<MealRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM meal_record \
                 WHERE student_id = $student_id \
                 AND meal_type = $meal_type \
                 AND meal_date = $meal_date",
            )
            .bind(("student_id", student_id.to_string()))
            .bind(("meal_type", meal_type.as_str().to_string()))
            .bind(("meal_date", meal_date.format(DATE_FMT).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MealRecordRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .next()
            .map(|row| row.try_into_record())
            .transpose()
            .map_err(Into::into)
    }

    async fn list_for_date(&self, meal_date: NaiveDate) -> MensaResult<Vec<MealRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM meal_record \
                 WHERE meal_date = $meal_date \
                 ORDER BY consumed_at ASC",
            )
            .bind(("meal_date", meal_date.format(DATE_FMT).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MealRecordRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
