//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::Deserialize;

/// Root configuration for the vault.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Entitlement table source.
    pub entitlements: EntitlementConfig,

    /// Client address resolution options.
    pub access: AccessConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Where the entitlement table comes from.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntitlementConfig {
    /// `ADDRESS>KEY=VALUE&KEY=VALUE,ADDRESS>...`. Blank selects the example table.
    pub allowed_ips: String,
}

impl fmt::Debug for EntitlementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitlementConfig")
            .field("allowed_ips", &format_args!("<{} bytes>", self.allowed_ips.len()))
            .finish()
    }
}

/// Client address resolution options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Accept the `testaddr` query parameter as an address source.
    pub allow_test_addr: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allow_test_addr: true,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Send `Cache-Control: no-store` on every response.
    pub no_store: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024, // 16KB
            no_store: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
