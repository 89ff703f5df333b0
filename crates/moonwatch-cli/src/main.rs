//! `moonwatch` binary entry point.

use std::process::ExitCode;

use clap::Parser;
use moonwatch_app::{Runtime, RuntimeConfig};
use moonwatch_cli::{Args, TerminalDriver};
use moonwatch_client::WebSocketTransport;
use moonwatch_core::SystemEnv;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = match args.client_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(page = %args.page, error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        },
    };

    tracing::info!(page = %args.page, "starting observer");
    let mut runtime = Runtime::new(
        SystemEnv,
        WebSocketTransport::new(),
        TerminalDriver::stdio(),
        config,
        RuntimeConfig::default(),
    );

    match runtime.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "observer stopped");
            ExitCode::FAILURE
        },
    }
}
