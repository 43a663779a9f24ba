//! SurrealDB repository implementations.

mod denial;
mod meal_record;
mod schedule;
mod student;

pub use denial::SurrealDenialRepository;
pub use meal_record::SurrealMealRecordRepository;
pub use schedule::SurrealScheduleRepository;
pub use student::SurrealStudentRepository;
