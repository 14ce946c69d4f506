//! Entitlement subsystem.
//!
//! # Data Flow
//! ```text
//! ALLOWED_IPS / entitlements.allowed_ips
//!     → parser.rs (strict split, typed errors)
//!     → table.rs (EntitlementTable, immutable)
//!     → shared via Arc with the gatekeeper
//! ```
//!
//! # Design Decisions
//! - Built once before the listener starts; never mutated afterwards
//! - Any malformed segment aborts startup, no partial table
//! - Lookups never fail: a miss is a `LookupResult`

pub mod parser;
pub mod table;

pub use parser::EntitlementError;
pub use table::{EntitlementTable, LookupResult, EXAMPLE_CONFIG};
