//! Integration tests for the repository implementations using
//! in-memory SurrealDB.

use chrono::{NaiveDate, NaiveTime, Utc};
use mensa_core::error::MensaError;
use mensa_core::models::denial::CreateDenial;
use mensa_core::models::meal::MealType;
use mensa_core::models::meal_record::CreateMealRecord;
use mensa_core::models::schedule::{CreateScheduleEntry, UpdateScheduleEntry};
use mensa_core::models::student::{CreateStudent, StudentStatus, UpdateStudent};
use mensa_core::repository::{
    DenialRepository, MealRecordRepository, Pagination, ScheduleRepository, StudentRepository,
};
use mensa_db::repository::{
    SurrealDenialRepository, SurrealMealRecordRepository, SurrealScheduleRepository,
    SurrealStudentRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mensa_db::run_migrations(&db).await.unwrap();
    db
}

fn student(student_id: &str, rfid: Option<&str>) -> CreateStudent {
    CreateStudent {
        student_id: student_id.into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        department: "Mathematics".into(),
        enrollment_year: 2024,
        rfid_uid: rfid.map(Into::into),
    }
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

// -----------------------------------------------------------------------
// Student tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_student() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    let created = repo.create(student("S100", Some("04:AB:CD"))).await.unwrap();
    assert_eq!(created.student_id, "S100");
    assert_eq!(created.status, StudentStatus::Active);

    let fetched = repo.get_by_student_id("S100").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.full_name(), "Ada Lovelace");
}

#[tokio::test]
async fn duplicate_student_id_is_rejected() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    repo.create(student("S100", None)).await.unwrap();
    let err = repo.create(student("S100", None)).await.unwrap_err();
    assert!(matches!(err, MensaError::AlreadyExists { .. }));
}

#[tokio::test]
async fn get_student_by_rfid() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    let created = repo.create(student("S200", Some("04:11:22"))).await.unwrap();

    let fetched = repo.get_by_rfid("04:11:22").await.unwrap();
    assert_eq!(fetched.id, created.id);

    let err = repo.get_by_rfid("FF:FF:FF").await.unwrap_err();
    assert!(matches!(err, MensaError::NotFound { .. }));
}

#[tokio::test]
async fn update_student_and_unpair_rfid() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    repo.create(student("S300", Some("04:33:44"))).await.unwrap();

    let updated = repo
        .update(
            "S300",
            UpdateStudent {
                department: Some("Physics".into()),
                status: Some(StudentStatus::Suspended),
                rfid_uid: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.department, "Physics");
    assert_eq!(updated.status, StudentStatus::Suspended);
    assert_eq!(updated.rfid_uid, None);
}

#[tokio::test]
async fn deactivate_is_a_soft_delete() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    repo.create(student("S400", None)).await.unwrap();
    repo.deactivate("S400").await.unwrap();

    // Record still exists, only the status changed.
    let fetched = repo.get_by_student_id("S400").await.unwrap();
    assert_eq!(fetched.status, StudentStatus::Inactive);

    let err = repo.deactivate("NOPE").await.unwrap_err();
    assert!(matches!(err, MensaError::NotFound { .. }));
}

#[tokio::test]
async fn list_students_paginated() {
    let db = setup().await;
    let repo = SurrealStudentRepository::new(db);

    for i in 0..5 {
        repo.create(student(&format!("S{i:03}"), None)).await.unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].student_id, "S000");

    let rest = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 2);
}

// -----------------------------------------------------------------------
// Schedule tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn schedule_entries_for_day_are_ordered_by_start_time() {
    let db = setup().await;
    let repo = SurrealScheduleRepository::new(db);

    // Insert out of order; the repository must return them sorted.
    repo.create(CreateScheduleEntry {
        day_of_week: 1,
        meal_type: MealType::Dinner,
        start_time: time("18:00"),
        end_time: time("20:00"),
    })
    .await
    .unwrap();
    repo.create(CreateScheduleEntry {
        day_of_week: 1,
        meal_type: MealType::Breakfast,
        start_time: time("07:00"),
        end_time: time("09:00"),
    })
    .await
    .unwrap();
    repo.create(CreateScheduleEntry {
        day_of_week: 1,
        meal_type: MealType::Lunch,
        start_time: time("12:00"),
        end_time: time("14:00"),
    })
    .await
    .unwrap();

    let entries = repo.list_active_for_day(1).await.unwrap();
    let meals: Vec<_> = entries.iter().map(|e| e.meal_type).collect();
    assert_eq!(
        meals,
        vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner]
    );

    // Other days are empty.
    assert!(repo.list_active_for_day(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_day_meal_window_is_rejected() {
    let db = setup().await;
    let repo = SurrealScheduleRepository::new(db);

    let entry = CreateScheduleEntry {
        day_of_week: 3,
        meal_type: MealType::Lunch,
        start_time: time("12:00"),
        end_time: time("14:00"),
    };
    repo.create(entry.clone()).await.unwrap();

    let err = repo.create(entry).await.unwrap_err();
    assert!(matches!(err, MensaError::AlreadyExists { .. }));
}

#[tokio::test]
async fn invalid_schedule_entry_fails_validation() {
    let db = setup().await;
    let repo = SurrealScheduleRepository::new(db);

    let err = repo
        .create(CreateScheduleEntry {
            day_of_week: 3,
            meal_type: MealType::Lunch,
            start_time: time("14:00"),
            end_time: time("12:00"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MensaError::Validation { .. }));
}

#[tokio::test]
async fn update_cannot_invert_a_serving_window() {
    let db = setup().await;
    let repo = SurrealScheduleRepository::new(db);

    let entry = repo
        .create(CreateScheduleEntry {
            day_of_week: 4,
            meal_type: MealType::Dinner,
            start_time: time("18:00"),
            end_time: time("20:00"),
        })
        .await
        .unwrap();

    // Moving only one bound past the other must be rejected.
    let err = repo
        .update(
            entry.id,
            UpdateScheduleEntry {
                start_time: Some(time("21:00")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MensaError::Validation { .. }));

    let err = repo
        .update(
            entry.id,
            UpdateScheduleEntry {
                end_time: Some(time("17:00")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MensaError::Validation { .. }));

    // The stored window is untouched and a consistent move still works.
    let updated = repo
        .update(
            entry.id,
            UpdateScheduleEntry {
                start_time: Some(time("17:30")),
                end_time: Some(time("19:30")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.start_time, time("17:30"));
    assert_eq!(updated.end_time, time("19:30"));
}

#[tokio::test]
async fn deactivated_entry_is_excluded_from_day_listing() {
    let db = setup().await;
    let repo = SurrealScheduleRepository::new(db);

    let entry = repo
        .create(CreateScheduleEntry {
            day_of_week: 5,
            meal_type: MealType::Breakfast,
            start_time: time("07:00"),
            end_time: time("09:00"),
        })
        .await
        .unwrap();

    repo.update(
        entry.id,
        UpdateScheduleEntry {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(repo.list_active_for_day(5).await.unwrap().is_empty());
    // Still visible in the full listing.
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

// -----------------------------------------------------------------------
// Denial tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn denial_roundtrip_and_deactivation() {
    let db = setup().await;
    let repo = SurrealDenialRepository::new(db);

    let denial = repo
        .create(CreateDenial {
            student_id: "S100".into(),
            start_date: date("2026-03-01"),
            end_date: Some(date("2026-03-10")),
            meal_types: vec![MealType::Lunch, MealType::Dinner],
            reason: "unpaid balance".into(),
        })
        .await
        .unwrap();

    let active = repo.list_active_for_student("S100").await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].meal_types.len(), 2);
    assert!(active[0].applies_to(date("2026-03-05"), MealType::Lunch));

    repo.deactivate(denial.id).await.unwrap();
    assert!(repo.list_active_for_student("S100").await.unwrap().is_empty());
}

#[tokio::test]
async fn open_ended_denial_roundtrips_without_end_date() {
    let db = setup().await;
    let repo = SurrealDenialRepository::new(db);

    repo.create(CreateDenial {
        student_id: "S200".into(),
        start_date: date("2026-01-01"),
        end_date: None,
        meal_types: vec![MealType::Breakfast],
        reason: "suspended".into(),
    })
    .await
    .unwrap();

    let active = repo.list_active_for_student("S200").await.unwrap();
    assert_eq!(active[0].end_date, None);
    assert!(active[0].applies_to(date("2030-06-01"), MealType::Breakfast));
}

// -----------------------------------------------------------------------
// Meal record tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_and_find_meal_record() {
    let db = setup().await;
    let repo = SurrealMealRecordRepository::new(db);

    let record = repo
        .insert(CreateMealRecord {
            student_id: "S100".into(),
            meal_type: MealType::Lunch,
            meal_date: date("2026-03-02"),
            consumed_at: Utc::now(),
        })
        .await
        .unwrap();
    assert_eq!(record.meal_type, MealType::Lunch);

    let found = repo
        .find("S100", MealType::Lunch, date("2026-03-02"))
        .await
        .unwrap();
    assert_eq!(found.unwrap().id, record.id);

    // Same student, different meal: no record.
    let other = repo
        .find("S100", MealType::Dinner, date("2026-03-02"))
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn duplicate_meal_record_is_rejected_by_the_index() {
    let db = setup().await;
    let repo = SurrealMealRecordRepository::new(db);

    let input = CreateMealRecord {
        student_id: "S100".into(),
        meal_type: MealType::Breakfast,
        meal_date: date("2026-03-02"),
        consumed_at: Utc::now(),
    };
    repo.insert(input.clone()).await.unwrap();

    let err = repo.insert(input).await.unwrap_err();
    assert!(matches!(err, MensaError::AlreadyExists { .. }));
}

/// Two concurrent insert attempts for the same (student, meal, date):
/// exactly one row survives, the loser gets a conflict. This is the
/// cross-surface double-scan race resolved at the storage layer.
#[tokio::test]
async fn concurrent_inserts_leave_exactly_one_record() {
    let db = setup().await;
    let repo_a = SurrealMealRecordRepository::new(db.clone());
    let repo_b = SurrealMealRecordRepository::new(db);

    let input = CreateMealRecord {
        student_id: "S100".into(),
        meal_type: MealType::Dinner,
        meal_date: date("2026-03-02"),
        consumed_at: Utc::now(),
    };

    let (a, b) = tokio::join!(repo_a.insert(input.clone()), repo_b.insert(input));

    assert!(
        a.is_ok() != b.is_ok(),
        "exactly one of the two inserts must win, got {a:?} / {b:?}"
    );
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser.unwrap_err(),
        MensaError::AlreadyExists { .. } | MensaError::Database(_)
    ));

    let day = repo_a.list_for_date(date("2026-03-02")).await.unwrap();
    assert_eq!(day.len(), 1);
}

#[tokio::test]
async fn list_for_date_is_scoped_to_that_date() {
    let db = setup().await;
    let repo = SurrealMealRecordRepository::new(db);

    for (sid, d) in [("S1", "2026-03-02"), ("S2", "2026-03-02"), ("S1", "2026-03-03")] {
        repo.insert(CreateMealRecord {
            student_id: sid.into(),
            meal_type: MealType::Lunch,
            meal_date: date(d),
            consumed_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.list_for_date(date("2026-03-02")).await.unwrap().len(), 2);
    assert_eq!(repo.list_for_date(date("2026-03-03")).await.unwrap().len(), 1);
}
