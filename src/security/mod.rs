//! Client identity subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (read proxy headers verbatim)
//!     → resolver.rs (validate each source, rank candidates)
//!     → address.rs (single-address grammar)
//!     → Pass candidates to the entitlement lookup
//! ```
//!
//! # Design Decisions
//! - Fail closed: a malformed proxy header rejects the whole request
//! - More than one hop is treated as a spoofing attempt
//! - No trust in client input

pub mod address;
pub mod headers;
pub mod resolver;

pub use address::ClientAddress;
pub use headers::RawHeaderSet;
pub use resolver::{AddressResolver, AddressSource, ResolveError, ResolvedAddresses};
