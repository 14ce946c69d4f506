//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build entitlement table → Bind listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Exit
//! ```

pub mod signals;
pub mod startup;

pub use startup::{prepare, StartupError};
