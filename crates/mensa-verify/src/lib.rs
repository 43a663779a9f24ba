//! mensa-verify - The verification core: scan-token parsing, meal
//! window resolution, the access decision engine, attendance
//! recording, and per-surface scan session state.
//!
//! Generic over the `mensa-core` repository traits so that this crate
//! has no dependency on the database crate.

pub mod config;
pub mod decision;
pub mod error;
pub mod service;
pub mod session;
pub mod token;
pub mod window;

pub use config::VerifyConfig;
pub use decision::{Cue, Decision, DenyReason};
pub use error::VerifyError;
pub use service::{VerifyOutcome, VerifyService};
pub use session::{ScanSession, SessionState};
pub use token::{QrPayload, ScanToken, parse_scan_token};
