//! Domain models for the mensa service.
//!
//! These are the core types shared across all crates.

pub mod denial;
pub mod meal;
pub mod meal_record;
pub mod schedule;
pub mod student;
