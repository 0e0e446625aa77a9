use crate::api_client::ApiClient;
use crate::clock::SystemClock;
use crate::configuration::Configuration;
use crate::configuration_handler::ConfigurationHandler;
use crate::session::{FileSessionStore, SessionStore};
use chrono::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod api_client;
mod availability;
mod backend;
mod clock;
mod commands;
mod configuration;
mod configuration_handler;
mod session;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments();
    let session = SessionStore::new(FileSessionStore::new(configuration.session_path()));
    let client = ApiClient::new(&configuration.api_base_url(), session);
    let interval = Duration::minutes(configuration.slot_interval_minutes());

    let command = configuration.command.clone();
    if let Err(err) = commands::run(command, &client, &SystemClock, interval).await {
        error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}
