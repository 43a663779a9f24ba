//! SurrealDB implementation of [`StudentRepository`].

use chrono::{DateTime, Utc};
use mensa_core::error::MensaResult;
use mensa_core::models::student::{CreateStudent, Student, StudentStatus, UpdateStudent};
use mensa_core::repository::{PaginatedResult, Pagination, StudentRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StudentRow {
    student_id: String,
    first_name: String,
    last_name: String,
    department: String,
    enrollment_year: i32,
    status: String,
    rfid_uid: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct StudentRowWithId {
    record_id: String,
    student_id: String,
    first_name: String,
    last_name: String,
    department: String,
    enrollment_year: i32,
    status: String,
    rfid_uid: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_status(s: &str) -> Result<StudentStatus, DbError> {
    match s {
        "Active" => Ok(StudentStatus::Active),
        "Inactive" => Ok(StudentStatus::Inactive),
        "Suspended" => Ok(StudentStatus::Suspended),
        other => Err(DbError::Migration(format!(
            "unknown student status: {other}"
        ))),
    }
}

fn status_to_string(s: &StudentStatus) -> &'static str {
    match s {
        StudentStatus::Active => "Active",
        StudentStatus::Inactive => "Inactive",
        StudentStatus::Suspended => "Suspended",
    }
}

impl StudentRow {
    fn into_student(self, id: Uuid) -> Result<Student, DbError> {
        Ok(Student {
            id,
            student_id: self.student_id,
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            enrollment_year: self.enrollment_year,
            status: parse_status(&self.status)?,
            rfid_uid: self.rfid_uid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StudentRowWithId {
    fn try_into_student(self) -> Result<Student, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Student {
            id,
            student_id: self.student_id,
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            enrollment_year: self.enrollment_year,
            status: parse_status(&self.status)?,
            rfid_uid: self.rfid_uid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Student repository.
#[derive(Clone)]
pub struct SurrealStudentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStudentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StudentRepository for SurrealStudentRepository<C> {
    async fn create(&self, input: CreateStudent) -> MensaResult<Student> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('student', $id) SET \
                 student_id = $student_id, \
                 first_name = $first_name, \
                 last_name = $last_name, \
                 department = $department, \
                 enrollment_year = $enrollment_year, \
                 status = 'Active', \
                 rfid_uid = $rfid_uid",
            )
            .bind(("id", id_str.clone()))
            .bind(("student_id", input.student_id.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("department", input.department))
            .bind(("enrollment_year", input.enrollment_year))
            .bind(("rfid_uid", input.rfid_uid))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| conflict_or_migration(e, "student"))?;

        let rows: Vec<StudentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            key: input.student_id,
        })?;

        row.into_student(id).map_err(Into::into)
    }

    async fn get_by_student_id(&self, student_id: &str) -> MensaResult<Student> {
        let student_id_owned = student_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM student \
                 WHERE student_id = $student_id",
            )
            .bind(("student_id", student_id_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            key: student_id_owned,
        })?;

        row.try_into_student().map_err(Into::into)
    }

    async fn get_by_rfid(&self, rfid_uid: &str) -> MensaResult<Student> {
        let rfid_owned = rfid_uid.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM student \
                 WHERE rfid_uid = $rfid_uid",
            )
            .bind(("rfid_uid", rfid_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            key: format!("rfid_uid={rfid_owned}"),
        })?;

        row.try_into_student().map_err(Into::into)
    }

    async fn update(&self, student_id: &str, input: UpdateStudent) -> MensaResult<Student> {
        let student_id_owned = student_id.to_string();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.enrollment_year.is_some() {
            sets.push("enrollment_year = $enrollment_year");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.rfid_uid.is_some() {
            sets.push("rfid_uid = $rfid_uid");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE student SET {} WHERE student_id = $student_id \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("student_id", student_id_owned.clone()));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(enrollment_year) = input.enrollment_year {
            builder = builder.bind(("enrollment_year", enrollment_year));
        }
        if let Some(status) = &input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(rfid_uid) = input.rfid_uid {
            builder = builder.bind(("rfid_uid", rfid_uid));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            key: student_id_owned,
        })?;

        row.try_into_student().map_err(Into::into)
    }

    async fn deactivate(&self, student_id: &str) -> MensaResult<()> {
        let student_id_owned = student_id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE student SET status = 'Inactive', \
                 updated_at = time::now() \
                 WHERE student_id = $student_id \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("student_id", student_id_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "student".into(),
                key: student_id_owned,
            }
            .into());
        }

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MensaResult<PaginatedResult<Student>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM student GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM student \
                 ORDER BY student_id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_student())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

/// Distinguish a unique-index violation from other statement failures.
pub(crate) fn conflict_or_migration(err: surrealdb::Error, entity: &str) -> DbError {
    let msg = err.to_string();
    if msg.contains("already contains") || msg.contains("unique") {
        DbError::Conflict {
            entity: entity.to_string(),
        }
    } else {
        DbError::Migration(msg)
    }
}
