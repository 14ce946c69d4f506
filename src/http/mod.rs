//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → gatekeeper.rs (resolve address, look up entitlement)
//!     → response.rs (status, body, diagnostic headers)
//!     → Send to client
//! ```

pub mod gatekeeper;
pub mod request;
pub mod response;
pub mod server;

pub use gatekeeper::{Decision, Gatekeeper, Verdict, KEY_DENIED_CODE};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, VaultServer};
