use crate::commands::Command;
use crate::configuration::Configuration;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "reserva", about = "Reservation management client")]
pub struct ConfigurationHandler {
    /// Base URL of the reservation API
    #[arg(
        long,
        env = "RESERVA_API_URL",
        default_value = "http://localhost:54321/api"
    )]
    api_url: String,

    /// File the session token and profile are kept in between runs
    #[arg(long, env = "RESERVA_SESSION_FILE", default_value = ".reserva/session.json")]
    session_file: PathBuf,

    /// Slot granularity in minutes
    #[arg(long, env = "RESERVA_SLOT_INTERVAL", default_value_t = 30)]
    slot_interval: i64,

    #[command(subcommand)]
    pub command: Command,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn api_base_url(&self) -> String {
        self.api_url.clone()
    }

    fn session_path(&self) -> PathBuf {
        self.session_file.clone()
    }

    fn slot_interval_minutes(&self) -> i64 {
        self.slot_interval
    }
}
