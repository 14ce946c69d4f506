//! Address-keyed secrets vault library

pub mod config;
pub mod entitlements;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::VaultConfig;
pub use entitlements::{EntitlementTable, LookupResult};
pub use http::{Gatekeeper, VaultServer};
pub use security::{AddressResolver, ClientAddress, RawHeaderSet};
