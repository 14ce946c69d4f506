//! Single-address grammar and the validated client address type.
//!
//! # Grammar
//! ```text
//! IPV4 = d{1,3} "." d{1,3} "." d{1,3} "." d{1,3}
//! IPV6 = h{1,4} (":" h{1,4}){7}            (lower-case hex, all 8 groups)
//!
//! X-Forwarded-For = IPV4 | IPV6
//! Forwarded       = 'for="' (IPV4 | IPV6) '";proto=http' ['s']
//! ```
//!
//! # Design Decisions
//! - Digit grouping only, no octet range checks
//! - No compressed IPv6 notation, no zone ids, no ports
//! - A comma anywhere means more than one hop and is rejected

use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

macro_rules! address_alternation {
    () => {
        r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}|[0-9a-f]{1,4}(?::[0-9a-f]{1,4}){7}"
    };
}

/// Pattern a bare address value (`X-Forwarded-For`, `testaddr`) must match.
pub const SINGLE_ADDRESS_PATTERN: &str = concat!("^(?:", address_alternation!(), ")$");

/// Pattern a `Forwarded` header value must match.
pub const FORWARDED_PATTERN: &str =
    concat!(r#"^for="(?:"#, address_alternation!(), r#")";proto=https?$"#);

static SINGLE_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SINGLE_ADDRESS_PATTERN).expect("single address pattern compiles"));

static FORWARDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FORWARDED_PATTERN).expect("forwarded pattern compiles"));

/// Exactly one IPv4 or IPv6 literal.
///
/// Only constructible through [`ClientAddress::parse`] or
/// [`ClientAddress::from_forwarded`], so a value of this type never carries a
/// port, a comma or a second hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientAddress(String);

impl ClientAddress {
    /// Validate a bare address against the single-address grammar.
    pub fn parse(value: &str) -> Option<Self> {
        SINGLE_ADDRESS_RE
            .is_match(value)
            .then(|| Self(value.to_string()))
    }

    /// Validate a `Forwarded` header value and extract its quoted address.
    pub fn from_forwarded(value: &str) -> Option<Self> {
        if !FORWARDED_RE.is_match(value) {
            return None;
        }
        // The text between the first and second double quote.
        value.split('"').nth(1).map(|addr| Self(addr.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClientAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}
