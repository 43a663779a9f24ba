//! Environment-driven server configuration.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use mensa_db::DbConfig;
use tracing::info;

pub struct Config {
    pub port: u16,
    pub db: DbConfig,
    /// HTTP endpoint of the RFID reader bridge. The poller is disabled
    /// when unset.
    pub rfid_reader_url: Option<String>,
    pub rfid_poll_interval: Duration,
}

impl Config {
    pub fn load() -> Self {
        let db = DbConfig {
            url: try_load("MENSA_DB_URL", "127.0.0.1:8000"),
            namespace: try_load("MENSA_DB_NS", "mensa"),
            database: try_load("MENSA_DB_NAME", "main"),
            username: try_load("MENSA_DB_USER", "root"),
            password: try_load("MENSA_DB_PASS", "root"),
        };

        Self {
            port: try_load("MENSA_PORT", "3000"),
            db,
            rfid_reader_url: env::var("MENSA_RFID_READER_URL").ok(),
            rfid_poll_interval: Duration::from_millis(try_load("MENSA_RFID_POLL_MS", "800")),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            tracing::warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
