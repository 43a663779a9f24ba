//! SurrealDB implementation of [`DenialRepository`].
//!
//! Dates are stored as "YYYY-MM-DD" strings. Date/meal scoping is not
//! evaluated here: the repository returns all active entries for a
//! student and the decision engine applies [`Denial::applies_to`].

use chrono::{DateTime, NaiveDate, Utc};
use mensa_core::error::MensaResult;
use mensa_core::models::denial::{CreateDenial, Denial};
use mensa_core::models::meal::MealType;
use mensa_core::repository::{DenialRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Debug, SurrealValue)]
struct DenialRow {
    student_id: String,
    start_date: String,
    end_date: Option<String>,
    meal_types: Vec<String>,
    is_active: bool,
    reason: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DenialRowWithId {
    record_id: String,
    student_id: String,
    start_date: String,
    end_date: Option<String>,
    meal_types: Vec<String>,
    is_active: bool,
    reason: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DbError::Migration(format!("invalid date '{s}': {e}")))
}

fn parse_meals(meals: Vec<String>) -> Result<Vec<MealType>, DbError> {
    meals
        .iter()
        .map(|m| {
            MealType::parse(m).ok_or_else(|| DbError::Migration(format!("unknown meal type: {m}")))
        })
        .collect()
}

impl DenialRow {
    fn into_denial(self, id: Uuid) -> Result<Denial, DbError> {
        Ok(Denial {
            id,
            student_id: self.student_id,
            start_date: parse_date(&self.start_date)?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
            meal_types: parse_meals(self.meal_types)?,
            is_active: self.is_active,
            reason: self.reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DenialRowWithId {
    fn try_into_denial(self) -> Result<Denial, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Denial {
            id,
            student_id: self.student_id,
            start_date: parse_date(&self.start_date)?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
            meal_types: parse_meals(self.meal_types)?,
            is_active: self.is_active,
            reason: self.reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Denial repository.
#[derive(Clone)]
pub struct SurrealDenialRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDenialRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DenialRepository for SurrealDenialRepository<C> {
    async fn create(&self, input: CreateDenial) -> MensaResult<Denial> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let meal_types: Vec<String> = input
            .meal_types
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();

        let result = self
            .db
            .query(
                "CREATE type::record('denial', $id) SET \
                 student_id = $student_id, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 meal_types = $meal_types, \
                 is_active = true, \
                 reason = $reason",
            )
            .bind(("id", id_str.clone()))
            .bind(("student_id", input.student_id))
            .bind(("start_date", input.start_date.format(DATE_FMT).to_string()))
            .bind((
                "end_date",
                input.end_date.map(|d| d.format(DATE_FMT).to_string()),
            ))
            .bind(("meal_types", meal_types))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<DenialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "denial".into(),
            key: id_str,
        })?;

        row.into_denial(id).map_err(Into::into)
    }

    async fn list_active_for_student(&self, student_id: &str) -> MensaResult<Vec<Denial>> {
        let student_id_owned = student_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM denial \
                 WHERE student_id = $student_id AND is_active = true \
                 ORDER BY start_date ASC",
            )
            .bind(("student_id", student_id_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DenialRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_denial())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn deactivate(&self, id: Uuid) -> MensaResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('denial', $id) SET \
                 is_active = false, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DenialRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "denial".into(),
                key: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MensaResult<PaginatedResult<Denial>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM denial GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM denial \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DenialRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_denial())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
