//! Shared application state.

use std::sync::Arc;

use mensa_db::DbManager;
use mensa_db::repository::{
    SurrealDenialRepository, SurrealMealRecordRepository, SurrealScheduleRepository,
    SurrealStudentRepository,
};
use mensa_verify::{ScanSession, VerifyConfig, VerifyService};
use surrealdb::engine::remote::ws::Client;

pub type Service = VerifyService<
    SurrealStudentRepository<Client>,
    SurrealScheduleRepository<Client>,
    SurrealDenialRepository<Client>,
    SurrealMealRecordRepository<Client>,
>;

/// One scanning surface per entry point; both share the verification
/// service and the store, so cross-surface double scans resolve at the
/// storage layer.
pub struct AppState {
    pub students: SurrealStudentRepository<Client>,
    pub schedule: SurrealScheduleRepository<Client>,
    pub denials: SurrealDenialRepository<Client>,
    pub records: SurrealMealRecordRepository<Client>,
    pub verify: Service,
    pub camera_session: ScanSession,
    pub rfid_session: ScanSession,
}

impl AppState {
    pub fn new(manager: &DbManager, config: VerifyConfig) -> Arc<Self> {
        let db = manager.client().clone();

        let verify = VerifyService::new(
            SurrealStudentRepository::new(db.clone()),
            SurrealScheduleRepository::new(db.clone()),
            SurrealDenialRepository::new(db.clone()),
            SurrealMealRecordRepository::new(db.clone()),
            config.clone(),
        );

        Arc::new(Self {
            students: SurrealStudentRepository::new(db.clone()),
            schedule: SurrealScheduleRepository::new(db.clone()),
            denials: SurrealDenialRepository::new(db.clone()),
            records: SurrealMealRecordRepository::new(db),
            verify,
            camera_session: ScanSession::new("camera", config.cooldown),
            rfid_session: ScanSession::new("rfid", config.cooldown),
        })
    }
}
