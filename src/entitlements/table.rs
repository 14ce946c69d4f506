//! The address-to-secrets table.

use std::fmt;
use std::str::FromStr;

use crate::entitlements::parser::{parse_entries, EntitlementError, Entries};
use crate::security::ClientAddress;

/// Built-in table used when no configuration string is supplied.
pub const EXAMPLE_CONFIG: &str = "123.123.123.123>abc=def&ghi=jkl,127.0.0.1>def=2,\
124.124.124.124>mno=pqr,2a02:0110:68a5:0000:0000:c24:0000:0001>stu=vwy";

/// Result of [`EntitlementTable::get`]. Absence is data, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    Found(&'a str),
    KeyNotPresent,
    AddressNotPresent,
}

/// Immutable `address -> (key name -> secret)` mapping.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EntitlementTable {
    entries: Entries,
}

impl EntitlementTable {
    /// Build the table from a configuration string.
    ///
    /// A blank string selects [`EXAMPLE_CONFIG`]. Anything else must parse
    /// completely.
    pub fn from_config_str(config: &str) -> Result<Self, EntitlementError> {
        let config = config.trim();
        if config.is_empty() {
            tracing::warn!("No entitlement configuration supplied, using the built-in example table");
            return Ok(Self::example());
        }
        config.parse()
    }

    pub fn example() -> Self {
        Self {
            entries: parse_entries(EXAMPLE_CONFIG).unwrap_or_default(),
        }
    }

    pub fn get(&self, address: &ClientAddress, key_name: &str) -> LookupResult<'_> {
        match self.entries.get(address) {
            None => LookupResult::AddressNotPresent,
            Some(secrets) => match secrets.get(key_name) {
                Some(secret) => LookupResult::Found(secret.as_str()),
                None => LookupResult::KeyNotPresent,
            },
        }
    }

    pub fn contains_address(&self, address: &ClientAddress) -> bool {
        self.entries.contains_key(address)
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered addresses with their key names, sorted. Secrets are not exposed.
    pub fn key_names(&self) -> Vec<(&ClientAddress, Vec<&str>)> {
        let mut listing: Vec<_> = self
            .entries
            .iter()
            .map(|(address, secrets)| {
                let mut keys: Vec<&str> = secrets.keys().map(String::as_str).collect();
                keys.sort_unstable();
                (address, keys)
            })
            .collect();
        listing.sort_by(|a, b| a.0.cmp(b.0));
        listing
    }
}

impl FromStr for EntitlementTable {
    type Err = EntitlementError;

    fn from_str(config: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            entries: parse_entries(config)?,
        })
    }
}

// Keeps secret values out of logs.
impl fmt::Debug for EntitlementTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.key_names().into_iter().map(|(a, k)| (a.as_str(), k)))
            .finish()
    }
}
