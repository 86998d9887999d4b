use anyhow::Result;
use clap::{Parser, Subcommand};
use waypost_backend::api;
use waypost_backend::config::WaypostConfig;
use waypost_backend::database::Database;
use waypost_backend::telemetry;
use waypost_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "Waypost backend daemon")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = WaypostConfig::from_env()?;
    let database = Database::connect(&config.paths)?;
    database.ensure_migrations()?;
    tracing::info!(
        db_path = %config.paths.db_path.display(),
        api_port = config.api_port,
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, database).await,
    }
}
