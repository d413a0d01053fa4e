// src/main.rs
mod cli;
mod logging;

use clap::Parser;
use cli::{Args, Command};
use rinkside::data_fetcher::models::{NewsQuery, NewsType};
use rinkside::{ApiManager, AppError, Config, FileStore};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

async fn load_config(args: &Args) -> Result<Config, AppError> {
    match &args.config_path {
        Some(path) => {
            let mut config = Config::load_from_path(path).await?;
            config.apply_env_overrides(|name| std::env::var(name).ok());
            config.validate()?;
            Ok(config)
        }
        None => Config::load().await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(manager: &ApiManager, command: Command) -> Result<(), AppError> {
    match command {
        Command::Health => print_json(&manager.health_check().await),
        Command::Teams => print_json(&manager.get_nhl_teams_or_fallback().await),
        Command::Standings => print_json(&manager.get_nhl_standings().await?),
        Command::Search { query, limit } => {
            print_json(&manager.search_nhl_players(&query, limit).await?)
        }
        Command::News {
            limit,
            news_type,
            team,
        } => {
            let news_type = news_type
                .map(|value| {
                    NewsType::parse(&value).ok_or_else(|| {
                        AppError::config_error(format!("Unknown news type '{value}'"))
                    })
                })
                .transpose()?;
            let query = NewsQuery {
                limit,
                news_type,
                team,
            };
            print_json(&manager.get_latest_news(&query).await?)
        }
        Command::LoginUrl => print_json(&json!({
            "authorization_url": manager.fantasy_authorization_url()?,
        })),
        Command::Callback { code, state } => {
            manager.complete_fantasy_login(&code, state.as_deref()).await?;
            print_json(&json!({ "status": manager.fantasy_auth_status() }))
        }
        Command::Logout => {
            manager.fantasy_logout().await?;
            print_json(&json!({ "status": manager.fantasy_auth_status() }))
        }
        Command::RateLimits => print_json(&manager.get_rate_limit_status().await),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let config = load_config(&args).await?;

    let (log_file_path, _guard) =
        logging::setup_logging(&args, config.log_file_path.as_deref()).await?;
    tracing::info!("Logs are being written to: {log_file_path}");

    let store = Arc::new(FileStore::open(config.resolved_storage_path())?);
    let manager = ApiManager::start(config, store)?;

    let result = run(&manager, args.command).await;
    manager.shutdown().await;
    if let Err(e) = &result {
        tracing::error!("Command failed: {e}");
    }
    result
}
