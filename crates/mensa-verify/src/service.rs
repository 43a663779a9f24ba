//! Verification service - the access decision engine and attendance
//! recorder.

use chrono::{DateTime, Utc};
use mensa_core::error::{MensaError, MensaResult};
use mensa_core::models::meal::MealType;
use mensa_core::models::meal_record::{CreateMealRecord, MealRecord};
use mensa_core::models::student::{Student, StudentStatus};
use mensa_core::repository::{
    DenialRepository, MealRecordRepository, ScheduleRepository, StudentRepository,
};
use tracing::{error, info, warn};

use crate::config::VerifyConfig;
use crate::decision::{Cue, Decision, DenyReason};
use crate::token::ScanToken;
use crate::window::{day_of_week, resolve_meal_window};

/// Terminal result of one scan attempt, after any write.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    /// The student was admitted and the attendance record persisted.
    Admitted {
        student: Student,
        meal_type: MealType,
        record: MealRecord,
    },
    Denied {
        reason: DenyReason,
    },
    /// The decision was ALLOW but the attendance insert failed, so the
    /// record's presence is uncertain. The operator must ask for a
    /// rescan rather than wave the student through.
    WriteFailed {
        message: String,
    },
}

impl VerifyOutcome {
    pub fn operator_message(&self) -> String {
        match self {
            VerifyOutcome::Admitted {
                student, meal_type, ..
            } => format!("{} admitted for {meal_type}.", student.full_name()),
            VerifyOutcome::Denied { reason } => reason.operator_message().to_string(),
            VerifyOutcome::WriteFailed { .. } => {
                "Could not save the check-in. Please rescan.".to_string()
            }
        }
    }

    pub fn cue(&self) -> Cue {
        match self {
            VerifyOutcome::Admitted { .. } => Cue::Success,
            VerifyOutcome::Denied { reason } => reason.cue(),
            VerifyOutcome::WriteFailed { .. } => Cue::Warning,
        }
    }
}

/// How the scan identified the student.
enum Identity<'a> {
    /// QR payload or bare id: resolved by external student id.
    StudentId(&'a str),
    /// RFID tag UID: resolved by the paired card.
    Rfid(&'a str),
}

/// The access decision engine and attendance recorder.
///
/// Generic over repository implementations so the verification layer
/// has no dependency on the database crate. Both scanning surfaces
/// share one instance against one store; the storage-level unique
/// index resolves cross-surface double scans.
pub struct VerifyService<St, Sc, De, Mr>
where
    St: StudentRepository,
    Sc: ScheduleRepository,
    De: DenialRepository,
    Mr: MealRecordRepository,
{
    students: St,
    schedule: Sc,
    denials: De,
    records: Mr,
    config: VerifyConfig,
}

impl<St, Sc, De, Mr> VerifyService<St, Sc, De, Mr>
where
    St: StudentRepository,
    Sc: ScheduleRepository,
    De: DenialRepository,
    Mr: MealRecordRepository,
{
    pub fn new(students: St, schedule: Sc, denials: De, records: Mr, config: VerifyConfig) -> Self {
        Self {
            students,
            schedule,
            denials,
            records,
            config,
        }
    }

    /// Decide a camera/QR scan. Read-only: the caller records
    /// attendance via [`VerifyService::verify`].
    pub async fn decide(&self, token: &ScanToken, now: DateTime<Utc>) -> Decision {
        self.decide_identity(Identity::StudentId(token.student_id()), now)
            .await
    }

    /// Decide an RFID scan by tag UID.
    pub async fn decide_rfid(&self, rfid_uid: &str, now: DateTime<Utc>) -> Decision {
        self.decide_identity(Identity::Rfid(rfid_uid), now).await
    }

    /// The strictly ordered decision sequence. Order matters and is
    /// observable: out-of-hours short-circuits before the student
    /// lookup, and a denial takes precedence over a duplicate.
    async fn decide_identity(&self, identity: Identity<'_>, now: DateTime<Utc>) -> Decision {
        // 1. Which meal is being served?
        let meal_type = match self.resolve_window(now).await {
            Ok(Some(meal)) => meal,
            Ok(None) => return Decision::deny(DenyReason::OutOfHours),
            Err(e) => return self.internal("schedule lookup failed", e),
        };

        // 2. Who is scanning?
        let lookup = match &identity {
            Identity::StudentId(id) => self.bounded(self.students.get_by_student_id(id)).await,
            Identity::Rfid(uid) => self.bounded(self.students.get_by_rfid(uid)).await,
        };
        let student = match lookup {
            Ok(student) => student,
            Err(MensaError::NotFound { .. }) => {
                return Decision::deny(DenyReason::UnknownStudent);
            }
            Err(e) => return self.internal("student lookup failed", e),
        };

        // A suspended or deactivated account is blocked outright; the
        // student exists, so this is not an unknown-card case.
        if student.status != StudentStatus::Active {
            info!(
                student_id = %student.student_id,
                status = ?student.status,
                "Scan blocked: student account not active"
            );
            return Decision::deny(DenyReason::Blocked);
        }

        // 3. Denial check, before the duplicate check.
        let today = now.date_naive();
        match self
            .bounded(self.denials.list_active_for_student(&student.student_id))
            .await
        {
            Ok(denials) => {
                if denials.iter().any(|d| d.applies_to(today, meal_type)) {
                    info!(
                        student_id = %student.student_id,
                        meal = %meal_type,
                        "Scan blocked by active denial"
                    );
                    return Decision::deny(DenyReason::Blocked);
                }
            }
            Err(e) => return self.internal("denial lookup failed", e),
        }

        // 4. Duplicate pre-check. Early exit only: the unique index on
        //    meal_record is the authoritative guard at insert time.
        match self
            .bounded(self.records.find(&student.student_id, meal_type, today))
            .await
        {
            Ok(Some(_)) => return Decision::deny(DenyReason::Duplicate),
            Ok(None) => {}
            Err(e) => return self.internal("meal record lookup failed", e),
        }

        // 5. Admit.
        Decision::Allow { student, meal_type }
    }

    /// Full verification for the camera/QR surface: decide, then on
    /// ALLOW persist the attendance record.
    pub async fn verify(&self, token: &ScanToken, now: DateTime<Utc>) -> VerifyOutcome {
        let decision = self.decide(token, now).await;
        self.record(decision, now).await
    }

    /// Full verification for the RFID surface.
    pub async fn verify_rfid(&self, rfid_uid: &str, now: DateTime<Utc>) -> VerifyOutcome {
        let decision = self.decide_rfid(rfid_uid, now).await;
        self.record(decision, now).await
    }

    /// Attendance recorder: the single point of state mutation.
    async fn record(&self, decision: Decision, now: DateTime<Utc>) -> VerifyOutcome {
        let (student, meal_type) = match decision {
            Decision::Allow { student, meal_type } => (student, meal_type),
            Decision::Deny { reason } => return VerifyOutcome::Denied { reason },
        };

        let input = CreateMealRecord {
            student_id: student.student_id.clone(),
            meal_type,
            meal_date: now.date_naive(),
            consumed_at: now,
        };

        match self.bounded(self.records.insert(input)).await {
            Ok(record) => {
                info!(
                    student_id = %student.student_id,
                    meal = %meal_type,
                    "Meal recorded"
                );
                VerifyOutcome::Admitted {
                    student,
                    meal_type,
                    record,
                }
            }
            // The index caught a concurrent scan of the same student:
            // report it exactly like a pre-check duplicate.
            Err(MensaError::AlreadyExists { .. }) => {
                warn!(
                    student_id = %student.student_id,
                    meal = %meal_type,
                    "Duplicate meal record rejected by unique index"
                );
                VerifyOutcome::Denied {
                    reason: DenyReason::Duplicate,
                }
            }
            Err(e) => {
                error!(
                    student_id = %student.student_id,
                    meal = %meal_type,
                    error = %e,
                    "Attendance insert failed after ALLOW decision"
                );
                VerifyOutcome::WriteFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn resolve_window(&self, now: DateTime<Utc>) -> MensaResult<Option<MealType>> {
        let entries = self
            .bounded(self.schedule.list_active_for_day(day_of_week(now)))
            .await?;
        Ok(resolve_meal_window(now, &entries))
    }

    /// Wrap a persistence call in the configured deadline, converting
    /// a hang into a plain error.
    async fn bounded<T>(&self, fut: impl Future<Output = MensaResult<T>>) -> MensaResult<T> {
        match tokio::time::timeout(self.config.repo_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MensaError::Timeout),
        }
    }

    fn internal(&self, context: &str, err: MensaError) -> Decision {
        error!(error = %err, "{context}");
        Decision::deny(DenyReason::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use mensa_core::models::denial::{CreateDenial, Denial};
    use mensa_core::models::schedule::{CreateScheduleEntry, ScheduleEntry, UpdateScheduleEntry};
    use mensa_core::models::student::{CreateStudent, UpdateStudent};
    use mensa_core::repository::{PaginatedResult, Pagination};
    use uuid::Uuid;

    // Stub repositories for the failure paths the in-memory database
    // cannot produce on demand.

    struct UnusedStudents;

    impl StudentRepository for UnusedStudents {
        async fn create(&self, _input: CreateStudent) -> MensaResult<Student> {
            unreachable!()
        }
        async fn get_by_student_id(&self, _student_id: &str) -> MensaResult<Student> {
            unreachable!()
        }
        async fn get_by_rfid(&self, _rfid_uid: &str) -> MensaResult<Student> {
            unreachable!()
        }
        async fn update(&self, _student_id: &str, _input: UpdateStudent) -> MensaResult<Student> {
            unreachable!()
        }
        async fn deactivate(&self, _student_id: &str) -> MensaResult<()> {
            unreachable!()
        }
        async fn list(&self, _pagination: Pagination) -> MensaResult<PaginatedResult<Student>> {
            unreachable!()
        }
    }

    /// Every student lookup fails as the store would on a lost
    /// connection.
    struct FailingStudents;

    impl StudentRepository for FailingStudents {
        async fn create(&self, _input: CreateStudent) -> MensaResult<Student> {
            unreachable!()
        }
        async fn get_by_student_id(&self, _student_id: &str) -> MensaResult<Student> {
            Err(MensaError::Database("connection reset".into()))
        }
        async fn get_by_rfid(&self, _rfid_uid: &str) -> MensaResult<Student> {
            Err(MensaError::Database("connection reset".into()))
        }
        async fn update(&self, _student_id: &str, _input: UpdateStudent) -> MensaResult<Student> {
            unreachable!()
        }
        async fn deactivate(&self, _student_id: &str) -> MensaResult<()> {
            unreachable!()
        }
        async fn list(&self, _pagination: Pagination) -> MensaResult<PaginatedResult<Student>> {
            unreachable!()
        }
    }

    /// The day listing never completes, as against a wedged store.
    struct StalledSchedule;

    impl ScheduleRepository for StalledSchedule {
        async fn create(&self, _input: CreateScheduleEntry) -> MensaResult<ScheduleEntry> {
            unreachable!()
        }
        async fn list_active_for_day(&self, _day_of_week: u8) -> MensaResult<Vec<ScheduleEntry>> {
            std::future::pending().await
        }
        async fn update(
            &self,
            _id: Uuid,
            _input: UpdateScheduleEntry,
        ) -> MensaResult<ScheduleEntry> {
            unreachable!()
        }
        async fn delete(&self, _id: Uuid) -> MensaResult<()> {
            unreachable!()
        }
        async fn list(&self) -> MensaResult<Vec<ScheduleEntry>> {
            unreachable!()
        }
    }

    /// One all-day lunch window on every weekday.
    struct AllDayLunch;

    impl ScheduleRepository for AllDayLunch {
        async fn create(&self, _input: CreateScheduleEntry) -> MensaResult<ScheduleEntry> {
            unreachable!()
        }
        async fn list_active_for_day(&self, day_of_week: u8) -> MensaResult<Vec<ScheduleEntry>> {
            Ok(vec![ScheduleEntry {
                id: Uuid::new_v4(),
                day_of_week,
                meal_type: MealType::Lunch,
                start_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }])
        }
        async fn update(
            &self,
            _id: Uuid,
            _input: UpdateScheduleEntry,
        ) -> MensaResult<ScheduleEntry> {
            unreachable!()
        }
        async fn delete(&self, _id: Uuid) -> MensaResult<()> {
            unreachable!()
        }
        async fn list(&self) -> MensaResult<Vec<ScheduleEntry>> {
            unreachable!()
        }
    }

    struct UnusedDenials;

    impl DenialRepository for UnusedDenials {
        async fn create(&self, _input: CreateDenial) -> MensaResult<Denial> {
            unreachable!()
        }
        async fn list_active_for_student(&self, _student_id: &str) -> MensaResult<Vec<Denial>> {
            unreachable!()
        }
        async fn deactivate(&self, _id: Uuid) -> MensaResult<()> {
            unreachable!()
        }
        async fn list(&self, _pagination: Pagination) -> MensaResult<PaginatedResult<Denial>> {
            unreachable!()
        }
    }

    struct UnusedRecords;

    impl MealRecordRepository for UnusedRecords {
        async fn insert(&self, _input: CreateMealRecord) -> MensaResult<MealRecord> {
            unreachable!()
        }
        async fn find(
            &self,
            _student_id: &str,
            _meal_type: MealType,
            _meal_date: NaiveDate,
        ) -> MensaResult<Option<MealRecord>> {
            unreachable!()
        }
        async fn list_for_date(&self, _meal_date: NaiveDate) -> MensaResult<Vec<MealRecord>> {
            unreachable!()
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 30, 0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn hung_persistence_call_resolves_as_internal() {
        let service = VerifyService::new(
            UnusedStudents,
            StalledSchedule,
            UnusedDenials,
            UnusedRecords,
            VerifyConfig::default(),
        );

        // The paused clock runs the deadline out immediately; the scan
        // must come back as an internal failure, not hang the lane.
        let decision = service
            .decide(&ScanToken::RawId("S1".to_string()), noon())
            .await;
        assert!(matches!(
            decision,
            Decision::Deny {
                reason: DenyReason::Internal
            }
        ));
    }

    #[tokio::test]
    async fn failed_student_read_is_internal_not_unknown() {
        let service = VerifyService::new(
            FailingStudents,
            AllDayLunch,
            UnusedDenials,
            UnusedRecords,
            VerifyConfig::default(),
        );

        // A read error is not evidence the student does not exist.
        let decision = service
            .decide(&ScanToken::RawId("S1".to_string()), noon())
            .await;
        assert!(matches!(
            decision,
            Decision::Deny {
                reason: DenyReason::Internal
            }
        ));

        let decision = service.decide_rfid("04:AA:BB", noon()).await;
        assert!(matches!(
            decision,
            Decision::Deny {
                reason: DenyReason::Internal
            }
        ));
    }
}
