//! RFID reader polling loop.
//!
//! The reader bridge exposes one HTTP endpoint that returns the
//! pending tag UID, if any, and clears it on read. The loop polls on a
//! fixed interval and skips polls while the RFID session is busy, so a
//! tag held against the reader does not queue up repeat scans while
//! the previous result is still on screen.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::routes::run_rfid_scan;
use crate::state::AppState;

#[derive(Deserialize)]
struct PendingTag {
    uid: Option<String>,
}

pub async fn run_rfid_poller(state: Arc<AppState>, reader_url: String, period: Duration) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(url = %reader_url, period_ms = period.as_millis() as u64, "RFID poller started");

    loop {
        ticker.tick().await;

        if state.rfid_session.is_busy().await {
            continue;
        }

        let uid = match poll_reader(&client, &reader_url).await {
            Ok(Some(uid)) => uid,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "RFID reader poll failed");
                continue;
            }
        };

        match run_rfid_scan(&state, &state.rfid_session, &uid).await {
            Ok(response) => {
                info!(uid = %uid, outcome = response.0.outcome, "RFID scan processed");
            }
            Err(e) => {
                warn!(uid = %uid, error = %e, "RFID scan rejected");
            }
        }
    }
}

async fn poll_reader(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<String>, reqwest::Error> {
    let tag: PendingTag = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(tag.uid.and_then(|uid| {
        let trimmed = uid.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    }))
}
