use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use common::logger::init_logger;
use server::{cli::Cli, config::AppConfig, desk::TradingDesk, server::CommandServer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("trading-server", cli.json_logs || is_production);

    info!("Starting trading server...");

    let cfg = AppConfig::from_cli_and_env(cli)?;
    let provider = Arc::new(cfg.provider.build()?);

    let desk = Arc::new(TradingDesk::new(provider, cfg.initial_state(), cfg.clock));
    desk.bootstrap(&cfg.tickers, cfg.reload_file.as_deref())
        .await
        .context("startup failed")?;
    desk.arm_refresh().await;

    let server =
        CommandServer::bind(&cfg.listen_addr, Arc::clone(&desk), cfg.max_command_bytes).await?;
    info!(addr = %server.local_addr()?, "listening for commands");

    tokio::select! {
        _ = server.serve() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutdown signal received");
        }
    }

    desk.shutdown().await;
    Ok(())
}
