//! Configuration string parser.
//!
//! ```text
//! CONFIG = ENTRY ("," ENTRY)*
//! ENTRY  = ADDRESS ">" PAIRS
//! PAIRS  = PAIR ("&" PAIR)*
//! PAIR   = KEY "=" VALUE
//! ```
//!
//! `>` separates the address from its pairs because `:` occurs in IPv6
//! literals. Entries and pairs are split strictly left to right; `ADDRESS`
//! ends at the first `>` and `KEY` ends at the first `=`, so values may
//! contain either character.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use thiserror::Error;

use crate::security::ClientAddress;

pub const ENTRY_SEPARATOR: char = ',';
pub const ADDRESS_SEPARATOR: char = '>';
pub const PAIR_SEPARATOR: char = '&';
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Malformed configuration. Always fatal at startup.
///
/// Messages name entries by position, validated address and key name only.
/// Unvalidated text may hold a secret and is never echoed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("entry #{index} is empty")]
    EmptyEntry { index: usize },

    #[error("entry #{index} is missing the '>' separator between address and pairs")]
    MissingSeparator { index: usize },

    #[error("entry #{index} has an empty address")]
    EmptyAddress { index: usize },

    #[error("entry #{index} (address '{address}') has no key=value pairs")]
    EmptyPairs { index: usize, address: String },

    #[error("entry #{index} does not start with a single IPv4 or full IPv6 literal")]
    InvalidAddress { index: usize },

    #[error("pair #{position} of address '{address}' is missing '='")]
    MissingEquals { address: String, position: usize },

    #[error("a pair of address '{address}' has an empty key")]
    EmptyKey { address: String },

    #[error("key '{key}' of address '{address}' has an empty value")]
    EmptyValue { address: String, key: String },

    #[error("address '{address}' is listed more than once")]
    DuplicateAddress { address: String },

    #[error("key '{key}' is listed more than once for address '{address}'")]
    DuplicateKey { address: String, key: String },
}

pub type Entries = HashMap<ClientAddress, HashMap<String, String>>;

/// Parse a configuration string. No partial result on error.
pub fn parse_entries(config: &str) -> Result<Entries, EntitlementError> {
    let mut entries = Entries::new();

    for (index, entry) in config.split(ENTRY_SEPARATOR).enumerate() {
        if entry.is_empty() {
            return Err(EntitlementError::EmptyEntry { index });
        }
        let (address, pairs) = entry
            .split_once(ADDRESS_SEPARATOR)
            .ok_or(EntitlementError::MissingSeparator { index })?;
        if address.is_empty() {
            return Err(EntitlementError::EmptyAddress { index });
        }
        let address =
            ClientAddress::parse(address).ok_or(EntitlementError::InvalidAddress { index })?;
        if pairs.is_empty() {
            return Err(EntitlementError::EmptyPairs {
                index,
                address: address.to_string(),
            });
        }

        let secrets = parse_pairs(&address, pairs)?;

        match entries.entry(address) {
            Entry::Occupied(slot) => {
                return Err(EntitlementError::DuplicateAddress {
                    address: slot.key().to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(secrets);
            }
        }
    }

    Ok(entries)
}

fn parse_pairs(
    address: &ClientAddress,
    pairs: &str,
) -> Result<HashMap<String, String>, EntitlementError> {
    let mut secrets = HashMap::new();

    for (position, pair) in pairs.split(PAIR_SEPARATOR).enumerate() {
        let (key, value) = pair.split_once(KEY_VALUE_SEPARATOR).ok_or_else(|| {
            EntitlementError::MissingEquals {
                address: address.to_string(),
                position,
            }
        })?;
        if key.is_empty() {
            return Err(EntitlementError::EmptyKey {
                address: address.to_string(),
            });
        }
        if value.is_empty() {
            return Err(EntitlementError::EmptyValue {
                address: address.to_string(),
                key: key.to_string(),
            });
        }
        if secrets.insert(key.to_string(), value.to_string()).is_some() {
            return Err(EntitlementError::DuplicateKey {
                address: address.to_string(),
                key: key.to_string(),
            });
        }
    }

    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret<'a>(entries: &'a Entries, address: &str, key: &str) -> Option<&'a str> {
        entries
            .get(address)
            .and_then(|secrets| secrets.get(key))
            .map(String::as_str)
    }

    #[test]
    fn test_parse_every_declared_pair() {
        let entries = parse_entries(
            "123.123.123.123>abc=def&ghi=jkl,127.0.0.1>def=2,\
             2a02:0110:68a5:0000:0000:c24:0000:0001>stu=vwy",
        )
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(secret(&entries, "123.123.123.123", "abc"), Some("def"));
        assert_eq!(secret(&entries, "123.123.123.123", "ghi"), Some("jkl"));
        assert_eq!(secret(&entries, "127.0.0.1", "def"), Some("2"));
        assert_eq!(
            secret(&entries, "2a02:0110:68a5:0000:0000:c24:0000:0001", "stu"),
            Some("vwy")
        );
    }

    #[test]
    fn test_value_keeps_later_separators() {
        let entries = parse_entries("1.1.1.1>token=a=b>c").unwrap();
        assert_eq!(secret(&entries, "1.1.1.1", "token"), Some("a=b>c"));
    }

    #[test]
    fn test_malformed_entries() {
        assert_eq!(
            parse_entries("1.1.1.1>a=b,").unwrap_err(),
            EntitlementError::EmptyEntry { index: 1 }
        );
        assert_eq!(
            parse_entries("1.1.1.1:a=b").unwrap_err(),
            EntitlementError::MissingSeparator { index: 0 }
        );
        assert_eq!(
            parse_entries(">a=b").unwrap_err(),
            EntitlementError::EmptyAddress { index: 0 }
        );
        assert_eq!(
            parse_entries("1.1.1.1>").unwrap_err(),
            EntitlementError::EmptyPairs {
                index: 0,
                address: "1.1.1.1".into()
            }
        );
        assert_eq!(
            parse_entries("1.1.1.1,2.2.2.2>a=b").unwrap_err(),
            EntitlementError::MissingSeparator { index: 0 }
        );
        assert_eq!(
            parse_entries("localhost>a=b").unwrap_err(),
            EntitlementError::InvalidAddress { index: 0 }
        );
    }

    #[test]
    fn test_malformed_pairs() {
        assert_eq!(
            parse_entries("1.1.1.1>abc").unwrap_err(),
            EntitlementError::MissingEquals {
                address: "1.1.1.1".into(),
                position: 0
            }
        );
        assert_eq!(
            parse_entries("1.1.1.1>a=b&&c=d").unwrap_err(),
            EntitlementError::MissingEquals {
                address: "1.1.1.1".into(),
                position: 1
            }
        );
        assert_eq!(
            parse_entries("1.1.1.1>=b").unwrap_err(),
            EntitlementError::EmptyKey { address: "1.1.1.1".into() }
        );
        assert_eq!(
            parse_entries("1.1.1.1>a=").unwrap_err(),
            EntitlementError::EmptyValue {
                address: "1.1.1.1".into(),
                key: "a".into()
            }
        );
    }

    #[test]
    fn test_duplicates() {
        assert_eq!(
            parse_entries("1.1.1.1>a=b,1.1.1.1>c=d").unwrap_err(),
            EntitlementError::DuplicateAddress { address: "1.1.1.1".into() }
        );
        assert_eq!(
            parse_entries("1.1.1.1>a=b&a=c").unwrap_err(),
            EntitlementError::DuplicateKey {
                address: "1.1.1.1".into(),
                key: "a".into()
            }
        );
    }

    #[test]
    fn test_errors_never_echo_values() {
        let malformed = [
            "1.1.1.1>a=s3cret,",
            "1.1.1.1:a=s3cret",
            ">a=s3cret",
            "1.1.1.1>a=s3cret,2.2.2.2>",
            "1.1.1.1 >a=s3cret",
            "1.1.1.1:a=s3cret>x",
            "1.1.1.1:s3cret>",
            "1.1.1.1>s3cret",
            "1.1.1.1>a=b&s3cret",
            "1.1.1.1>=s3cret",
            "1.1.1.1>a=s3cret&b=",
            "1.1.1.1>a=s3cret,1.1.1.1>b=s3cret",
            "1.1.1.1>a=s3cret&a=other",
        ];
        for config in malformed {
            let message = parse_entries(config).unwrap_err().to_string();
            assert!(!message.contains("s3cret"), "{config}: {message}");
        }
    }

    #[test]
    fn test_every_error_kind_is_reachable_without_echo() {
        let cases = [
            ("1.1.1.1>a=s3cret,", "entry #1 is empty"),
            ("1.1.1.1:a=s3cret", "entry #0 is missing the '>' separator"),
            (">a=s3cret", "entry #0 has an empty address"),
            ("1.1.1.1>a=s3cret,2.2.2.2>", "entry #1 (address '2.2.2.2') has no key=value pairs"),
            ("1.1.1.1 >a=s3cret", "entry #0 does not start with a single"),
            ("1.1.1.1>a=b&s3cret", "pair #1 of address '1.1.1.1' is missing '='"),
            ("1.1.1.1>=s3cret", "a pair of address '1.1.1.1' has an empty key"),
            ("1.1.1.1>a=s3cret&b=", "key 'b' of address '1.1.1.1' has an empty value"),
            ("1.1.1.1>a=s3cret,1.1.1.1>b=x", "address '1.1.1.1' is listed more than once"),
            ("1.1.1.1>a=s3cret&a=x", "key 'a' is listed more than once"),
        ];
        for (config, expected) in cases {
            let message = parse_entries(config).unwrap_err().to_string();
            assert!(message.starts_with(expected), "{config}: {message}");
        }
    }
}
