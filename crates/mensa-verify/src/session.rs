//! Per-surface scan session state.
//!
//! Each scanning surface (camera, RFID poller) owns one session. The
//! session serializes decisions on its surface: while a verification
//! is in flight, or its result is still on screen during the
//! cooldown, new tokens are refused with [`VerifyError::Busy`]. State
//! is explicit struct state behind a mutex, not module-level globals.
//!
//! Flow: Idle -> Scanning -> Verifying -> Completed -> (cooldown) -> Idle.
//! No transition skips Verifying.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::VerifyError;
use crate::service::VerifyOutcome;

#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    /// A token has been received and is being decoded.
    Scanning,
    /// The decision sequence is running.
    Verifying,
    /// Terminal result, displayed until the cooldown elapses.
    Completed(VerifyOutcome),
}

struct Inner {
    state: SessionState,
    completed_at: Option<Instant>,
}

/// One scanning surface's session.
pub struct ScanSession {
    surface: String,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl ScanSession {
    pub fn new(surface: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            surface: surface.into(),
            cooldown,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                completed_at: None,
            }),
        }
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Accept a new token, entering Scanning. Refuses while busy; a
    /// completed result whose cooldown has elapsed resets to Idle
    /// first, so the next scan after the display window is accepted.
    pub async fn begin(&self) -> Result<(), VerifyError> {
        let mut inner = self.inner.lock().await;

        if let SessionState::Completed(_) = inner.state
            && let Some(at) = inner.completed_at
            && at.elapsed() >= self.cooldown
        {
            debug!(surface = %self.surface, "Cooldown elapsed, session reset");
            inner.state = SessionState::Idle;
            inner.completed_at = None;
        }

        match inner.state {
            SessionState::Idle => {
                inner.state = SessionState::Scanning;
                Ok(())
            }
            _ => Err(VerifyError::Busy),
        }
    }

    /// Token decoded; the decision sequence starts.
    pub async fn start_verifying(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Verifying;
    }

    /// Decode failed before verification; return straight to Idle.
    pub async fn abort(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Idle;
        inner.completed_at = None;
    }

    /// Record the terminal outcome; the result stays displayed for the
    /// cooldown period.
    pub async fn complete(&self, outcome: VerifyOutcome) {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Completed(outcome);
        inner.completed_at = Some(Instant::now());
    }

    /// Whether the surface would refuse a token right now. Used by the
    /// RFID poller to skip polls instead of queueing scans.
    pub async fn is_busy(&self) -> bool {
        let inner = self.inner.lock().await;
        match inner.state {
            SessionState::Idle => false,
            SessionState::Completed(_) => inner
                .completed_at
                .is_none_or(|at| at.elapsed() < self.cooldown),
            _ => true,
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }
}
