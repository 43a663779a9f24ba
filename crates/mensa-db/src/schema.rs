//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums, times of day ("HH:MM"), and
//! dates ("YYYY-MM-DD") are stored as strings with ASSERT constraints
//! for validation.
//!
//! The unique index on `meal_record (student_id, meal_type, meal_date)`
//! is the storage-level duplicate guard: a second attendance insert for
//! the same student, meal, and date fails at the index rather than
//! producing a silent duplicate row, even across concurrent scanning
//! surfaces.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 - initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Students
-- =======================================================================
DEFINE TABLE student SCHEMAFULL;
DEFINE FIELD student_id ON TABLE student TYPE string;
DEFINE FIELD first_name ON TABLE student TYPE string;
DEFINE FIELD last_name ON TABLE student TYPE string;
DEFINE FIELD department ON TABLE student TYPE string;
DEFINE FIELD enrollment_year ON TABLE student TYPE int;
DEFINE FIELD status ON TABLE student TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Suspended'];
DEFINE FIELD rfid_uid ON TABLE student TYPE option<string>;
DEFINE FIELD created_at ON TABLE student TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE student TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_student_external_id ON TABLE student \
    COLUMNS student_id UNIQUE;
DEFINE INDEX idx_student_rfid ON TABLE student COLUMNS rfid_uid;

-- =======================================================================
-- Weekly meal schedule
-- =======================================================================
DEFINE TABLE schedule_entry SCHEMAFULL;
DEFINE FIELD day_of_week ON TABLE schedule_entry TYPE int \
    ASSERT $value >= 0 AND $value <= 6;
DEFINE FIELD meal_type ON TABLE schedule_entry TYPE string \
    ASSERT $value IN ['breakfast', 'lunch', 'dinner'];
DEFINE FIELD start_time ON TABLE schedule_entry TYPE string;
DEFINE FIELD end_time ON TABLE schedule_entry TYPE string;
DEFINE FIELD is_active ON TABLE schedule_entry TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE schedule_entry TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE schedule_entry TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_schedule_day_meal ON TABLE schedule_entry \
    COLUMNS day_of_week, meal_type UNIQUE;

-- =======================================================================
-- Denials (time-bounded, meal-scoped restrictions)
-- =======================================================================
DEFINE TABLE denial SCHEMAFULL;
DEFINE FIELD student_id ON TABLE denial TYPE string;
DEFINE FIELD start_date ON TABLE denial TYPE string;
DEFINE FIELD end_date ON TABLE denial TYPE option<string>;
DEFINE FIELD meal_types ON TABLE denial TYPE array<string> \
    ASSERT $value ALLINSIDE ['breakfast', 'lunch', 'dinner'];
DEFINE FIELD is_active ON TABLE denial TYPE bool DEFAULT true;
DEFINE FIELD reason ON TABLE denial TYPE string;
DEFINE FIELD created_at ON TABLE denial TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE denial TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_denial_student ON TABLE denial COLUMNS student_id;

-- =======================================================================
-- Meal records (attendance)
-- =======================================================================
DEFINE TABLE meal_record SCHEMAFULL;
DEFINE FIELD student_id ON TABLE meal_record TYPE string;
DEFINE FIELD meal_type ON TABLE meal_record TYPE string \
    ASSERT $value IN ['breakfast', 'lunch', 'dinner'];
DEFINE FIELD meal_date ON TABLE meal_record TYPE string;
DEFINE FIELD consumed_at ON TABLE meal_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_meal_record_unique ON TABLE meal_record \
    COLUMNS student_id, meal_type, meal_date UNIQUE;
";

/// Bring the schema up to the latest version.
///
/// Reads the highest applied version from `_migration` and runs every
/// newer entry of [`MIGRATIONS`] in order, recording each one as it
/// lands. Safe to call on every startup.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = current_version(db).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying schema migration"
        );

        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "migration v{} '{}' failed: {e}",
                migration.version, migration.name,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "could not record migration v{}: {e}",
                    migration.version,
                ))
            })?;

        info!(version = migration.version, "Schema migration applied");
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}
