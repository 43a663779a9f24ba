//! HTTP route handlers.
//!
//! Scan endpoints return 200 with an outcome payload even for business
//! denials: a denied scan is a successfully answered verification
//! request, and the operator terminal needs the message and cue either
//! way. Admin CRUD errors map to HTTP statuses via [`AppError`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use mensa_core::models::denial::{CreateDenial, Denial};
use mensa_core::models::meal::MealType;
use mensa_core::models::meal_record::MealRecord;
use mensa_core::models::schedule::{CreateScheduleEntry, ScheduleEntry, UpdateScheduleEntry};
use mensa_core::models::student::{CreateStudent, Student, UpdateStudent};
use mensa_core::repository::{
    DenialRepository, MealRecordRepository, Pagination, ScheduleRepository, StudentRepository,
};
use mensa_verify::{Cue, QrPayload, ScanSession, VerifyOutcome, parse_scan_token};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan/qr", post(scan_qr))
        .route("/scan/rfid", post(scan_rfid))
        .route("/students", post(create_student).get(list_students))
        .route(
            "/students/{student_id}",
            get(get_student).put(update_student).delete(deactivate_student),
        )
        .route("/students/{student_id}/qr", get(student_qr_payload))
        .route("/schedule", post(create_schedule_entry).get(list_schedule))
        .route(
            "/schedule/{id}",
            put(update_schedule_entry).delete(delete_schedule_entry),
        )
        .route("/denials", post(create_denial).get(list_denials))
        .route("/denials/{id}", delete(deactivate_denial))
        .route("/records/{date}", get(records_for_date))
        .with_state(state)
}

// -----------------------------------------------------------------------
// Scan endpoints
// -----------------------------------------------------------------------

#[derive(Deserialize)]
pub struct QrScanRequest {
    /// Raw text decoded from the QR code by the camera.
    pub token: String,
}

#[derive(Deserialize)]
pub struct RfidScanRequest {
    pub uid: String,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<mensa_verify::DenyReason>,
    pub message: String,
    pub cue: Cue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
}

impl From<VerifyOutcome> for ScanResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        let message = outcome.operator_message();
        let cue = outcome.cue();
        match outcome {
            VerifyOutcome::Admitted {
                student, meal_type, ..
            } => Self {
                outcome: "admitted",
                reason: None,
                message,
                cue,
                student: Some(student),
                meal_type: Some(meal_type),
            },
            VerifyOutcome::Denied { reason } => Self {
                outcome: "denied",
                reason: Some(reason),
                message,
                cue,
                student: None,
                meal_type: None,
            },
            VerifyOutcome::WriteFailed { .. } => Self {
                outcome: "write_failed",
                reason: None,
                message,
                cue,
                student: None,
                meal_type: None,
            },
        }
    }
}

async fn scan_qr(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QrScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    let session = &state.camera_session;
    session.begin().await?;

    let token = match parse_scan_token(&request.token) {
        Ok(token) => token,
        Err(e) => {
            session.abort().await;
            return Err(e.into());
        }
    };

    session.start_verifying().await;
    let outcome = state.verify.verify(&token, Utc::now()).await;
    session.complete(outcome.clone()).await;

    Ok(Json(outcome.into()))
}

async fn scan_rfid(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RfidScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    run_rfid_scan(&state, &state.rfid_session, &request.uid).await
}

/// Shared by the HTTP endpoint and the background poller.
pub async fn run_rfid_scan(
    state: &AppState,
    session: &ScanSession,
    uid: &str,
) -> Result<Json<ScanResponse>, AppError> {
    session.begin().await?;

    let uid = uid.trim();
    if uid.is_empty() {
        session.abort().await;
        return Err(mensa_verify::VerifyError::InvalidToken("empty RFID uid".into()).into());
    }

    session.start_verifying().await;
    let outcome = state.verify.verify_rfid(uid, Utc::now()).await;
    session.complete(outcome.clone()).await;

    Ok(Json(outcome.into()))
}

// -----------------------------------------------------------------------
// Students
// -----------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: u64,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let default = Pagination::default();
        Pagination {
            offset: q.offset,
            limit: q.limit.unwrap_or(default.limit),
        }
    }
}

#[derive(Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateStudent>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.students.create(input).await?))
}

async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Student>>, AppError> {
    let result = state.students.list(page.into()).await?;
    Ok(Json(Page {
        items: result.items,
        total: result.total,
        offset: result.offset,
        limit: result.limit,
    }))
}

async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.students.get_by_student_id(&student_id).await?))
}

async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
    Json(input): Json<UpdateStudent>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.students.update(&student_id, input).await?))
}

async fn deactivate_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<(), AppError> {
    state.students.deactivate(&student_id).await?;
    Ok(())
}

/// The JSON document the print flow embeds in the student's QR image.
/// Image rendering itself is external; this endpoint only issues the
/// payload.
async fn student_qr_payload(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<QrPayload>, AppError> {
    let student = state.students.get_by_student_id(&student_id).await?;
    Ok(Json(QrPayload::for_student(&student, Utc::now())))
}

// -----------------------------------------------------------------------
// Schedule
// -----------------------------------------------------------------------

async fn create_schedule_entry(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateScheduleEntry>,
) -> Result<Json<ScheduleEntry>, AppError> {
    Ok(Json(state.schedule.create(input).await?))
}

async fn list_schedule(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    Ok(Json(state.schedule.list().await?))
}

async fn update_schedule_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateScheduleEntry>,
) -> Result<Json<ScheduleEntry>, AppError> {
    Ok(Json(state.schedule.update(id, input).await?))
}

async fn delete_schedule_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(), AppError> {
    state.schedule.delete(id).await?;
    Ok(())
}

// -----------------------------------------------------------------------
// Denials
// -----------------------------------------------------------------------

async fn create_denial(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateDenial>,
) -> Result<Json<Denial>, AppError> {
    Ok(Json(state.denials.create(input).await?))
}

async fn list_denials(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Denial>>, AppError> {
    let result = state.denials.list(page.into()).await?;
    Ok(Json(Page {
        items: result.items,
        total: result.total,
        offset: result.offset,
        limit: result.limit,
    }))
}

async fn deactivate_denial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(), AppError> {
    state.denials.deactivate(id).await?;
    Ok(())
}

// -----------------------------------------------------------------------
// Records
// -----------------------------------------------------------------------

async fn records_for_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Vec<MealRecord>>, AppError> {
    Ok(Json(state.records.list_for_date(date).await?))
}
