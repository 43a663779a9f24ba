//! Verification configuration.

use std::time::Duration;

/// Configuration for the verification service and scan sessions.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Bounded deadline for each persistence call during a decision.
    /// A call that exceeds it resolves the scan as an internal error
    /// instead of hanging the lane (default: 5s).
    pub repo_timeout: Duration,
    /// How long a completed scan result stays on screen before the
    /// session returns to idle and accepts the next scan
    /// (default: 2.8s).
    pub cooldown: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            repo_timeout: Duration::from_secs(5),
            cooldown: Duration::from_millis(2800),
        }
    }
}
