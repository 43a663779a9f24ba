//! mensa-core - Domain models, repository contracts, and the shared
//! error taxonomy for the mensa cafeteria verification service.
//!
//! This crate has no I/O: the concrete persistence layer lives in
//! `mensa-db` and the verification logic in `mensa-verify`, both of
//! which depend only on the traits and types defined here.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{MensaError, MensaResult};
