//! Client address resolution.
//!
//! # Data Flow
//! ```text
//! RawHeaderSet
//!     → ForwardedForStrategy  (validate X-Forwarded-For)
//!     → ForwardedStrategy     (validate Forwarded, extract quoted address)
//!     → TestAddrStrategy      (validate ?testaddr=, optional)
//!     → ResolvedAddresses     (candidates ranked Forwarded > X-Forwarded-For > testaddr)
//! ```
//!
//! Strategies run in the order given. The first `Invalid` halts resolution,
//! even when a later source would have produced a usable address.

use std::fmt;

use thiserror::Error;

use crate::security::address::{ClientAddress, FORWARDED_PATTERN, SINGLE_ADDRESS_PATTERN};
use crate::security::headers::RawHeaderSet;

/// Fixed body for "no usable address".
pub const NO_ADDRESS_CODE: &str = "E1000";

/// Where a candidate address came from.
///
/// Variant order is lookup preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressSource {
    Forwarded,
    ForwardedFor,
    TestAddr,
}

impl AddressSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSource::Forwarded => "forwarded",
            AddressSource::ForwardedFor => "x-forwarded-for",
            AddressSource::TestAddr => "testaddr",
        }
    }
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSource::TestAddr => write!(f, "{} parameter", self.as_str()),
            _ => write!(f, "{} header", self.as_str()),
        }
    }
}

/// Per-request resolution failure. The `Display` text is the response body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{origin} '{value}' does not match expected pattern {pattern}")]
    Invalid {
        origin: AddressSource,
        value: String,
        pattern: &'static str,
    },

    #[error("{}", NO_ADDRESS_CODE)]
    NoAddress,
}

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Absent,
    Present(ClientAddress),
    Invalid(ResolveError),
}

/// One way of deriving a client address from the raw request inputs.
pub trait AddressStrategy: Send + Sync + fmt::Debug {
    fn source(&self) -> AddressSource;

    fn resolve(&self, raw: &RawHeaderSet) -> Resolution;
}

fn validate(
    origin: AddressSource,
    value: &str,
    pattern: &'static str,
    parse: fn(&str) -> Option<ClientAddress>,
) -> Resolution {
    if value.is_empty() {
        return Resolution::Absent;
    }
    match parse(value) {
        Some(addr) => Resolution::Present(addr),
        None => Resolution::Invalid(ResolveError::Invalid {
            origin,
            value: value.to_string(),
            pattern,
        }),
    }
}

/// `X-Forwarded-For: 187.148.123.154`
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedForStrategy;

impl AddressStrategy for ForwardedForStrategy {
    fn source(&self) -> AddressSource {
        AddressSource::ForwardedFor
    }

    fn resolve(&self, raw: &RawHeaderSet) -> Resolution {
        validate(
            self.source(),
            &raw.forwarded_for,
            SINGLE_ADDRESS_PATTERN,
            ClientAddress::parse,
        )
    }
}

/// `Forwarded: for="187.148.123.154";proto=https`
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedStrategy;

impl AddressStrategy for ForwardedStrategy {
    fn source(&self) -> AddressSource {
        AddressSource::Forwarded
    }

    fn resolve(&self, raw: &RawHeaderSet) -> Resolution {
        validate(
            self.source(),
            &raw.forwarded,
            FORWARDED_PATTERN,
            ClientAddress::from_forwarded,
        )
    }
}

/// `?testaddr=187.148.123.154`
#[derive(Debug, Clone, Copy, Default)]
pub struct TestAddrStrategy;

impl AddressStrategy for TestAddrStrategy {
    fn source(&self) -> AddressSource {
        AddressSource::TestAddr
    }

    fn resolve(&self, raw: &RawHeaderSet) -> Resolution {
        validate(
            self.source(),
            &raw.test_addr,
            SINGLE_ADDRESS_PATTERN,
            ClientAddress::parse,
        )
    }
}

/// Successful resolution: every validated candidate plus the untouched
/// observability fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddresses {
    pub real_ip: String,
    pub remote_addr: String,
    candidates: Vec<(AddressSource, ClientAddress)>,
}

impl ResolvedAddresses {
    /// Candidates in lookup order.
    pub fn candidates(&self) -> impl Iterator<Item = &ClientAddress> {
        self.candidates.iter().map(|(_, addr)| addr)
    }

    pub fn get(&self, source: AddressSource) -> Option<&ClientAddress> {
        self.candidates
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, addr)| addr)
    }

    pub fn forwarded(&self) -> Option<&ClientAddress> {
        self.get(AddressSource::Forwarded)
    }

    pub fn forwarded_for(&self) -> Option<&ClientAddress> {
        self.get(AddressSource::ForwardedFor)
    }

    pub fn test_addr(&self) -> Option<&ClientAddress> {
        self.get(AddressSource::TestAddr)
    }
}

/// Ordered list of strategies.
#[derive(Debug)]
pub struct AddressResolver {
    strategies: Vec<Box<dyn AddressStrategy>>,
}

impl AddressResolver {
    pub fn new(strategies: Vec<Box<dyn AddressStrategy>>) -> Self {
        Self { strategies }
    }

    /// `X-Forwarded-For`, then `Forwarded`, then (optionally) `testaddr`.
    pub fn standard(allow_test_addr: bool) -> Self {
        let mut strategies: Vec<Box<dyn AddressStrategy>> =
            vec![Box::new(ForwardedForStrategy), Box::new(ForwardedStrategy)];
        if allow_test_addr {
            strategies.push(Box::new(TestAddrStrategy));
        }
        Self::new(strategies)
    }

    pub fn resolve(&self, raw: &RawHeaderSet) -> Result<ResolvedAddresses, ResolveError> {
        let mut candidates = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.resolve(raw) {
                Resolution::Absent => {}
                Resolution::Present(addr) => candidates.push((strategy.source(), addr)),
                Resolution::Invalid(err) => return Err(err),
            }
        }

        if candidates.is_empty() {
            return Err(ResolveError::NoAddress);
        }
        candidates.sort_by_key(|(source, _)| *source);

        Ok(ResolvedAddresses {
            real_ip: raw.real_ip.clone(),
            remote_addr: raw.remote_addr.clone(),
            candidates,
        })
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::standard(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(forwarded_for: &str, forwarded: &str, test_addr: &str) -> RawHeaderSet {
        RawHeaderSet {
            forwarded_for: forwarded_for.into(),
            forwarded: forwarded.into(),
            test_addr: test_addr.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_forwarded_for_only() {
        let resolved = AddressResolver::default()
            .resolve(&raw("123.123.123.123", "", ""))
            .unwrap();
        let candidates: Vec<_> = resolved.candidates().map(|a| a.as_str()).collect();
        assert_eq!(candidates, vec!["123.123.123.123"]);
        assert!(resolved.forwarded().is_none());
    }

    #[test]
    fn test_forwarded_is_extracted_and_ranked_first() {
        let resolved = AddressResolver::default()
            .resolve(&raw(
                "123.123.123.123",
                r#"for="124.124.124.124";proto=https"#,
                "127.0.0.1",
            ))
            .unwrap();
        let candidates: Vec<_> = resolved.candidates().map(|a| a.as_str()).collect();
        assert_eq!(
            candidates,
            vec!["124.124.124.124", "123.123.123.123", "127.0.0.1"]
        );
        assert_eq!(resolved.forwarded().unwrap().as_str(), "124.124.124.124");
        assert_eq!(resolved.forwarded_for().unwrap().as_str(), "123.123.123.123");
        assert_eq!(resolved.test_addr().unwrap().as_str(), "127.0.0.1");
    }

    #[test]
    fn test_multi_hop_forwarded_for_names_header_and_value() {
        let err = AddressResolver::default()
            .resolve(&raw("125.125.125.125,124.124.124.124", "", ""))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "x-forwarded-for header '125.125.125.125,124.124.124.124' does not match expected pattern"
        ));
        assert!(message.ends_with(SINGLE_ADDRESS_PATTERN));
    }

    #[test]
    fn test_invalid_forwarded_for_wins_over_valid_forwarded() {
        let err = AddressResolver::default()
            .resolve(&raw("1.1.1.1,2.2.2.2", r#"for="124.124.124.124";proto=https"#, ""))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Invalid { origin: AddressSource::ForwardedFor, .. }
        ));
    }

    #[test]
    fn test_double_hop_forwarded() {
        let value = r#"123.123.123.123,for="124.124.124.124";proto=https"#;
        let err = AddressResolver::default()
            .resolve(&raw("", value, ""))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("forwarded header '{value}' does not match expected pattern {FORWARDED_PATTERN}")
        );
    }

    #[test]
    fn test_nothing_supplied() {
        let err = AddressResolver::default()
            .resolve(&RawHeaderSet::default())
            .unwrap_err();
        assert_eq!(err, ResolveError::NoAddress);
        assert_eq!(err.to_string(), "E1000");
    }

    #[test]
    fn test_real_ip_does_not_resolve() {
        let input = RawHeaderSet {
            real_ip: "123.123.123.123".into(),
            remote_addr: "10.0.0.1:4000".into(),
            ..Default::default()
        };
        let err = AddressResolver::default().resolve(&input).unwrap_err();
        assert_eq!(err, ResolveError::NoAddress);
    }

    #[test]
    fn test_test_addr_disabled() {
        let resolver = AddressResolver::standard(false);
        let err = resolver.resolve(&raw("", "", "123.123.123.123")).unwrap_err();
        assert_eq!(err, ResolveError::NoAddress);

        // Not even validated when switched off
        let err = resolver.resolve(&raw("", "", "garbage")).unwrap_err();
        assert_eq!(err, ResolveError::NoAddress);
    }

    #[test]
    fn test_invalid_test_addr() {
        let err = AddressResolver::default()
            .resolve(&raw("", "", "1.1.1.1,2.2.2.2"))
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("testaddr parameter '1.1.1.1,2.2.2.2' does not match expected pattern"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = AddressResolver::default();
        let input = raw(
            "2a02:0110:68a5:0000:0000:c24:0000:0001",
            r#"for="124.124.124.124";proto=http"#,
            "",
        );
        assert_eq!(resolver.resolve(&input), resolver.resolve(&input));
    }

    #[test]
    fn test_custom_strategy_order() {
        // Only Forwarded is consulted
        let strategies: Vec<Box<dyn AddressStrategy>> = vec![Box::new(ForwardedStrategy)];
        let resolver = AddressResolver::new(strategies);
        let err = resolver.resolve(&raw("not an address", "", "")).unwrap_err();
        assert_eq!(err, ResolveError::NoAddress);
    }
}
