//! Request gatekeeper.
//!
//! Turns one request's raw inputs into a decision:
//!
//! | situation                                   | status | body           |
//! |---------------------------------------------|--------|----------------|
//! | proxy header present but malformed          | 401    | the reason     |
//! | no address, or no candidate in the table    | 401    | `E1000`        |
//! | candidate registered, key missing or empty  | 403    | `E1001`        |
//! | candidate registered, key present           | 200    | the secret     |
//!
//! Candidates are tried in lookup order (`Forwarded`, `X-Forwarded-For`,
//! `testaddr`); the first one with a table entry decides.

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::entitlements::{EntitlementTable, LookupResult};
use crate::security::resolver::NO_ADDRESS_CODE;
use crate::security::{AddressResolver, RawHeaderSet, ResolveError, ResolvedAddresses};

/// Fixed body for "registered address, unknown key".
pub const KEY_DENIED_CODE: &str = "E1001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Granted(String),
    Forbidden,
    Unauthorized(String),
}

impl Decision {
    pub fn status(&self) -> StatusCode {
        match self {
            Decision::Granted(_) => StatusCode::OK,
            Decision::Forbidden => StatusCode::FORBIDDEN,
            Decision::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Decision::Granted(secret) => secret,
            Decision::Forbidden => KEY_DENIED_CODE,
            Decision::Unauthorized(reason) => reason,
        }
    }

    /// Metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Granted(_) => "granted",
            Decision::Forbidden => "forbidden",
            Decision::Unauthorized(_) => "unauthorized",
        }
    }
}

/// A decision plus the addresses it was based on (absent when resolution failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub resolved: Option<ResolvedAddresses>,
}

#[derive(Debug)]
pub struct Gatekeeper {
    table: Arc<EntitlementTable>,
    resolver: AddressResolver,
}

impl Gatekeeper {
    pub fn new(table: Arc<EntitlementTable>, resolver: AddressResolver) -> Self {
        Self { table, resolver }
    }

    pub fn table(&self) -> &EntitlementTable {
        &self.table
    }

    /// `key_name` is only honoured for GET.
    pub fn handle(&self, method: &Method, key_name: Option<&str>, raw: &RawHeaderSet) -> Verdict {
        let resolved = match self.resolver.resolve(raw) {
            Ok(resolved) => resolved,
            Err(err) => {
                match &err {
                    ResolveError::Invalid { origin, .. } => {
                        tracing::warn!(source = origin.as_str(), error = %err, "Rejected client address");
                    }
                    ResolveError::NoAddress => {
                        tracing::debug!(remote_addr = %raw.remote_addr, "No client address supplied");
                    }
                }
                return Verdict {
                    decision: Decision::Unauthorized(err.to_string()),
                    resolved: None,
                };
            }
        };

        let key_name = if *method == Method::GET {
            key_name.unwrap_or_default()
        } else {
            ""
        };

        Verdict {
            decision: self.decide(&resolved, key_name),
            resolved: Some(resolved),
        }
    }

    fn decide(&self, resolved: &ResolvedAddresses, key_name: &str) -> Decision {
        for address in resolved.candidates() {
            match self.table.get(address, key_name) {
                LookupResult::Found(secret) => {
                    tracing::debug!(address = %address, key_name, "Entitlement granted");
                    return Decision::Granted(secret.to_string());
                }
                LookupResult::KeyNotPresent => {
                    tracing::debug!(address = %address, key_name, "Key not entitled");
                    return Decision::Forbidden;
                }
                LookupResult::AddressNotPresent => continue,
            }
        }

        tracing::debug!(
            candidates = resolved.candidates().count(),
            "No registered client address"
        );
        Decision::Unauthorized(NO_ADDRESS_CODE.to_string())
    }
}
