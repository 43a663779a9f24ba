//! SurrealDB implementation of [`ScheduleRepository`].
//!
//! Times of day are stored as "HH:MM" strings; lexical order on that
//! form matches chronological order, so the DB can sort serving
//! windows directly.

use chrono::{DateTime, NaiveTime, Utc};
use mensa_core::error::{MensaError, MensaResult};
use mensa_core::models::meal::MealType;
use mensa_core::models::schedule::{CreateScheduleEntry, ScheduleEntry, UpdateScheduleEntry};
use mensa_core::repository::ScheduleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::student::conflict_or_migration;

const TIME_FMT: &str = "%H:%M";

#[derive(Debug, SurrealValue)]
struct ScheduleRow {
    day_of_week: u8,
    meal_type: String,
    start_time: String,
    end_time: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ScheduleRowWithId {
    record_id: String,
    day_of_week: u8,
    meal_type: String,
    start_time: String,
    end_time: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_meal(s: &str) -> Result<MealType, DbError> {
    MealType::parse(s).ok_or_else(|| DbError::Migration(format!("unknown meal type: {s}")))
}

fn parse_time(s: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|e| DbError::Migration(format!("invalid time of day '{s}': {e}")))
}

impl ScheduleRow {
    fn into_entry(self, id: Uuid) -> Result<ScheduleEntry, DbError> {
        Ok(ScheduleEntry {
            id,
            day_of_week: self.day_of_week,
            meal_type: parse_meal(&self.meal_type)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ScheduleRowWithId {
    fn try_into_entry(self) -> Result<ScheduleEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(ScheduleEntry {
            id,
            day_of_week: self.day_of_week,
            meal_type: parse_meal(&self.meal_type)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Schedule repository.
#[derive(Clone)]
pub struct SurrealScheduleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScheduleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id_str: &str) -> Result<ScheduleEntry, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('schedule_entry', $id)")
            .bind(("id", id_str.to_string()))
            .await?;

        let rows: Vec<ScheduleRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "schedule_entry".into(),
                key: id_str.to_string(),
            })?
            .try_into_entry()
    }
}

impl<C: Connection> ScheduleRepository for SurrealScheduleRepository<C> {
    async fn create(&self, input: CreateScheduleEntry) -> MensaResult<ScheduleEntry> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('schedule_entry', $id) SET \
                 day_of_week = $day_of_week, \
                 meal_type = $meal_type, \
                 start_time = $start_time, \
                 end_time = $end_time, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("day_of_week", input.day_of_week))
            .bind(("meal_type", input.meal_type.as_str().to_string()))
            .bind(("start_time", input.start_time.format(TIME_FMT).to_string()))
            .bind(("end_time", input.end_time.format(TIME_FMT).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| conflict_or_migration(e, "schedule_entry"))?;

        let rows: Vec<ScheduleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "schedule_entry".into(),
            key: id_str,
        })?;

        row.into_entry(id).map_err(Into::into)
    }

    async fn list_active_for_day(&self, day_of_week: u8) -> MensaResult<Vec<ScheduleEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM schedule_entry \
                 WHERE day_of_week = $day_of_week AND is_active = true \
                 ORDER BY start_time ASC",
            )
            .bind(("day_of_week", day_of_week))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScheduleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateScheduleEntry) -> MensaResult<ScheduleEntry> {
        let id_str = id.to_string();

        // A partial update can invert the serving window, so check the
        // pair that would result against the stored row first.
        if input.start_time.is_some() || input.end_time.is_some() {
            let current = self.fetch(&id_str).await?;
            let start = input.start_time.unwrap_or(current.start_time);
            let end = input.end_time.unwrap_or(current.end_time);
            if start >= end {
                return Err(MensaError::Validation {
                    message: format!("start_time {start} must precede end_time {end}"),
                });
            }
        }

        let mut sets = Vec::new();
        if input.start_time.is_some() {
            sets.push("start_time = $start_time");
        }
        if input.end_time.is_some() {
            sets.push("end_time = $end_time");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('schedule_entry', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(start_time) = input.start_time {
            builder = builder.bind(("start_time", start_time.format(TIME_FMT).to_string()));
        }
        if let Some(end_time) = input.end_time {
            builder = builder.bind(("end_time", end_time.format(TIME_FMT).to_string()));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ScheduleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "schedule_entry".into(),
            key: id_str,
        })?;

        row.into_entry(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> MensaResult<()> {
        self.db
            .query("DELETE type::record('schedule_entry', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> MensaResult<Vec<ScheduleEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM schedule_entry \
                 ORDER BY day_of_week ASC, start_time ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScheduleRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
