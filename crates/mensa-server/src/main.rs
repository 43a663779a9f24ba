//! mensa server - application entry point.

mod config;
mod error;
mod poller;
mod routes;
mod state;

use mensa_db::DbManager;
use mensa_verify::VerifyConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("Starting mensa server...");

    let config = Config::load();

    let manager = DbManager::connect(&config.db)
        .await
        .expect("Failed to connect to SurrealDB");
    mensa_db::run_migrations(manager.client())
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(&manager, VerifyConfig::default());

    if let Some(reader_url) = config.rfid_reader_url.clone() {
        tokio::spawn(poller::run_rfid_poller(
            state.clone(),
            reader_url,
            config.rfid_poll_interval,
        ));
    } else {
        info!("MENSA_RFID_READER_URL not set, RFID poller disabled");
    }

    let app = routes::router(state);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind server address");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("mensa server stopped.");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
