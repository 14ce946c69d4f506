//! Address-keyed secrets vault (v1)
//!
//! Answers `GET /?keyname=<name>` with the secret registered for the calling
//! client's address.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                     ADDR VAULT                        │
//!                  │                                                       │
//!  Client Request  │  ┌─────────┐    ┌────────────┐    ┌──────────────┐   │
//!  ────────────────┼─▶│  http   │───▶│  security  │───▶│ entitlements │   │
//!                  │  │ server  │    │  resolver  │    │    table     │   │
//!                  │  └─────────┘    └────────────┘    └──────┬───────┘   │
//!                  │                                          │           │
//!  Client Response │  ┌─────────┐    ┌────────────┐           │           │
//!  ◀───────────────┼──│response │◀───│ gatekeeper │◀──────────┘           │
//!                  │  └─────────┘    └────────────┘                        │
//!                  │                                                       │
//!                  │  config · lifecycle · observability                   │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use addr_vault::config::{self, loader::CONFIG_PATH_ENV};
use addr_vault::lifecycle;
use addr_vault::observability::logging;

#[derive(Parser)]
#[command(name = "addr-vault")]
#[command(about = "Serves secrets to callers identified by their proxied client address", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;

    logging::init(&config.observability);

    tracing::info!("addr-vault v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        allow_test_addr = config.access.allow_test_addr,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    let (server, listener) = lifecycle::prepare(config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
