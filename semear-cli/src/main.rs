use anyhow::{Context, Result};
use clap::Parser;

use semear_cli::api::{RetryingStore, SheetsClient};
use semear_cli::app::SessionContext;
use semear_cli::cli::Cli;
use semear_cli::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = AppConfig::load().context(
        "failed to load configuration (run with a config.toml under the platform config dir)",
    )?;
    let token = config.token()?;

    let store = RetryingStore::new(
        SheetsClient::new(&config.spreadsheet_id, token),
        config.retry.to_retry_config(),
    );

    let student = cli
        .student
        .clone()
        .unwrap_or_else(|| config.username.clone());
    let ctx = SessionContext::new(&config.username, student);

    semear_cli::cli::run(cli.command, &store, &ctx).await
}
