//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter
//! - Build the entitlement table from validated configuration
//! - Bind the listener and hand back a ready server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The table exists before the listener does (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::VaultConfig;
use crate::entitlements::{EntitlementError, EntitlementTable};
use crate::http::VaultServer;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid entitlement configuration: {0}")]
    Entitlements(#[from] EntitlementError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
}

/// Parse `entitlements.allowed_ips`. Malformed input aborts startup.
pub fn build_table(config: &VaultConfig) -> Result<Arc<EntitlementTable>, StartupError> {
    let table = EntitlementTable::from_config_str(&config.entitlements.allowed_ips)?;

    tracing::info!(
        addresses = table.len(),
        keys = table.key_names().iter().map(|(_, keys)| keys.len()).sum::<usize>(),
        "Entitlement table loaded"
    );
    metrics::record_table_size(table.len());

    Ok(Arc::new(table))
}

/// Everything up to, but not including, serving.
pub async fn prepare(config: VaultConfig) -> Result<(VaultServer, TcpListener), StartupError> {
    // The recorder must exist before the first gauge write.
    if config.observability.metrics_enabled {
        // Validation guarantees the address parses
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let table = build_table(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    Ok((VaultServer::new(config, table), listener))
}
