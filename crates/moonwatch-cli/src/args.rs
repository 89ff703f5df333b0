//! Command-line configuration.

use std::time::Duration;

use clap::Parser;
use moonwatch_client::ClientConfig;
use moonwatch_core::{ConnectionConfig, ConnectionError, PageLocation};

/// Spectate a social-deduction game from the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "moonwatch", version, about)]
pub struct Args {
    /// Page URL of the game; the observer endpoint is derived from it
    #[arg(long, default_value = "http://localhost:8080/")]
    pub page: String,

    /// Reconnect attempts before giving up
    #[arg(long, default_value_t = 5)]
    pub max_reconnects: u32,

    /// Delay before each reconnect, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub reconnect_delay_ms: u64,

    /// Heartbeat interval, in seconds
    #[arg(long, default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// Default replay speed for /start
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Log filter, e.g. `debug` or `moonwatch_core=trace`. Falls back to
    /// `RUST_LOG`, then `warn`.
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    /// Client configuration these arguments describe.
    ///
    /// # Errors
    ///
    /// `InvalidEndpoint` if `--page` is not an http(s) or ws(s) URL.
    pub fn client_config(&self) -> Result<ClientConfig, ConnectionError> {
        Ok(ClientConfig {
            connection: ConnectionConfig {
                location: PageLocation::from_page_url(&self.page)?,
                max_reconnect_attempts: self.max_reconnects,
                reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
                heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            },
            default_speed: self.speed,
        })
    }
}
