//! Response assembly.
//!
//! # Responsibilities
//! - Map a gatekeeper `Verdict` to status and plain-text body
//! - Echo the resolved address fields as diagnostic headers
//!
//! # Design Decisions
//! - Diagnostic headers are only sent when resolution succeeded
//! - Empty fields and values that are not valid header text are skipped

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::http::gatekeeper::Verdict;
use crate::security::headers::{FORWARDED, X_FORWARDED_FOR, X_REAL_IP, X_REMOTE_ADDR, X_TEST_ADDR};
use crate::security::{ClientAddress, ResolvedAddresses};

impl IntoResponse for Verdict {
    fn into_response(self) -> Response {
        let mut response = (self.decision.status(), self.decision.body().to_string()).into_response();
        if let Some(resolved) = &self.resolved {
            apply_diagnostic_headers(response.headers_mut(), resolved);
        }
        response
    }
}

pub fn apply_diagnostic_headers(headers: &mut HeaderMap, resolved: &ResolvedAddresses) {
    let fields = [
        (X_REAL_IP, Some(resolved.real_ip.as_str())),
        (X_FORWARDED_FOR, resolved.forwarded_for().map(ClientAddress::as_str)),
        (FORWARDED, resolved.forwarded().map(ClientAddress::as_str)),
        (X_REMOTE_ADDR, Some(resolved.remote_addr.as_str())),
        (X_TEST_ADDR, resolved.test_addr().map(ClientAddress::as_str)),
    ];

    for (name, value) in fields {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}
