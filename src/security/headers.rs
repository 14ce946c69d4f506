//! Proxy-related request inputs, read verbatim.
//!
//! # Responsibilities
//! - Collect `X-Real-Ip`, `X-Forwarded-For`, `Forwarded`
//! - Carry the transport peer address and the `testaddr` override
//!
//! # Design Decisions
//! - Nothing is trimmed or normalized here; validation happens in the resolver
//! - Repeated header lines are joined with `,` so they read as multiple hops
//! - Non-ASCII bytes are kept (lossily) so they fail validation instead of
//!   silently disappearing

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const FORWARDED: &str = "forwarded";
pub const X_REMOTE_ADDR: &str = "x-remote-addr";
pub const X_TEST_ADDR: &str = "x-test-addr";

/// The raw inputs of one request. Empty string means "not sent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaderSet {
    pub real_ip: String,
    pub forwarded_for: String,
    pub forwarded: String,
    pub remote_addr: String,
    pub test_addr: String,
}

impl RawHeaderSet {
    pub fn from_request_parts(
        headers: &HeaderMap,
        remote_addr: Option<SocketAddr>,
        test_addr: Option<&str>,
    ) -> Self {
        Self {
            real_ip: header_text(headers, X_REAL_IP),
            forwarded_for: header_text(headers, X_FORWARDED_FOR),
            forwarded: header_text(headers, FORWARDED),
            remote_addr: remote_addr.map(|a| a.to_string()).unwrap_or_default(),
            test_addr: test_addr.unwrap_or_default().to_string(),
        }
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for RawHeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "real_ip={:?} forwarded_for={:?} forwarded={:?} remote_addr={:?} test_addr={:?}",
            self.real_ip, self.forwarded_for, self.forwarded, self.remote_addr, self.test_addr
        )
    }
}
