use std::path::PathBuf;

use clap::Parser;
use scheduler::clock::{DEFAULT_CLOSE, DEFAULT_OPEN};

#[derive(Debug, Parser)]
#[command(name = "server", version, about = "Start the trading server.")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Refresh cadence in minutes (1, 5, 15, 30 or 60)
    #[arg(long, default_value_t = 5)]
    pub minutes: u32,

    /// Reload historical prices from a `timestamp,price` file
    #[arg(long)]
    pub reload: Option<PathBuf>,

    /// Tickers to start with. Max of 3
    #[arg(long, num_args = 1..)]
    pub tickers: Vec<String>,

    /// Invert the strategy
    #[arg(long)]
    pub flip_signal: bool,

    /// Session open, local time
    #[arg(long, default_value = DEFAULT_OPEN)]
    pub market_open: String,

    /// Session close, local time
    #[arg(long, default_value = DEFAULT_CLOSE)]
    pub market_close: String,

    /// One JSON object per log line (also on when APP_ENV=production)
    #[arg(long)]
    pub json_logs: bool,
}
