//! # Composite Key Index
//!
//! Encodes structured keys (type tag + ordered attribute tuple) onto the flat
//! byte-string keyspace of the backing store, so that multi-attribute queries
//! can be emulated with prefix range scans.
//!
//! Layout: `0x00 tag 0x00 attr1 0x00 attr2 0x00 ...`. The leading NUL keeps
//! composite keys out of any host-reserved plain-text namespace, and every
//! attribute is NUL-terminated. Tags and attributes are NUL-free, which makes
//! the encoding collision-free across tags and makes the encoding of
//! `(tag, attrs[..k])` a byte prefix of exactly the keys whose attribute
//! tuple starts with those `k` attributes.

use crate::domain::errors::LedgerError;
use serde::{Deserialize, Serialize};

/// Delimiter separating the tag and each attribute.
pub const DELIMITER: u8 = 0x00;

/// Type tag namespacing each entity kind in the shared keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    Account,
    Asset,
    Selling,
    SellingByBuyer,
    Donating,
    DonatingByGrantee,
}

impl EntityTag {
    /// Stable string form used inside keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Asset => "asset",
            Self::Selling => "selling",
            Self::SellingByBuyer => "sellingByBuyer",
            Self::Donating => "donating",
            Self::DonatingByGrantee => "donatingByGrantee",
        }
    }

    /// Number of attributes in a full key of this kind.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Account => 1,
            Self::Asset | Self::Selling | Self::SellingByBuyer | Self::DonatingByGrantee => 2,
            Self::Donating => 3,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "account" => Some(Self::Account),
            "asset" => Some(Self::Asset),
            "selling" => Some(Self::Selling),
            "sellingByBuyer" => Some(Self::SellingByBuyer),
            "donating" => Some(Self::Donating),
            "donatingByGrantee" => Some(Self::DonatingByGrantee),
            _ => None,
        }
    }
}

/// Encode the full key for a record.
///
/// Attributes must be non-empty and NUL-free; a full key carries at least one
/// attribute. Deterministic and collision-free across tags.
pub fn encode(tag: EntityTag, attrs: &[&str]) -> Result<Vec<u8>, LedgerError> {
    if attrs.is_empty() {
        return Err(LedgerError::invalid_argument(
            "a full composite key requires at least one attribute",
        ));
    }
    prefix(tag, attrs)
}

/// Encode the scan prefix for `(tag, attrs)`.
///
/// With zero attributes this selects every record of the tag. The result is a
/// byte prefix of exactly the full keys whose attribute tuple starts with
/// `attrs`.
pub fn prefix(tag: EntityTag, attrs: &[&str]) -> Result<Vec<u8>, LedgerError> {
    let mut key = Vec::with_capacity(2 + tag.as_str().len() + attrs.len() * 8);
    key.push(DELIMITER);
    key.extend_from_slice(tag.as_str().as_bytes());
    key.push(DELIMITER);
    for attr in attrs {
        if attr.is_empty() {
            return Err(LedgerError::invalid_argument(format!(
                "empty attribute in composite key for tag {}",
                tag.as_str()
            )));
        }
        if attr.bytes().any(|b| b == DELIMITER) {
            return Err(LedgerError::invalid_argument(format!(
                "attribute contains NUL byte in composite key for tag {}",
                tag.as_str()
            )));
        }
        key.extend_from_slice(attr.as_bytes());
        key.push(DELIMITER);
    }
    Ok(key)
}

/// Decode a composite key back into its tag and attribute tuple.
///
/// Failure means the key did not come from [`encode`] and the store holds
/// foreign or corrupt data.
pub fn decode(key: &[u8]) -> Result<(EntityTag, Vec<String>), LedgerError> {
    let rest = key
        .strip_prefix(&[DELIMITER])
        .ok_or_else(|| LedgerError::serialization("composite key missing leading delimiter"))?;
    let rest = rest
        .strip_suffix(&[DELIMITER])
        .ok_or_else(|| LedgerError::serialization("composite key missing trailing delimiter"))?;

    let mut segments = rest.split(|&b| b == DELIMITER).map(|seg| {
        std::str::from_utf8(seg)
            .map_err(|e| LedgerError::serialization(format!("non-UTF-8 key segment: {e}")))
    });

    let tag_str = segments
        .next()
        .ok_or_else(|| LedgerError::serialization("composite key missing tag"))??;
    let tag = EntityTag::parse(tag_str)
        .ok_or_else(|| LedgerError::serialization(format!("unknown entity tag: {tag_str}")))?;

    let attrs = segments
        .map(|seg| seg.map(str::to_owned))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((tag, attrs))
}

/// Render a timestamp as a key attribute.
///
/// Zero-padded decimal so lexicographic key order equals numeric order;
/// mirror records keyed by `(party, created_at)` scan back in creation order.
#[must_use]
pub fn timestamp_attr(timestamp: u64) -> String {
    format!("{timestamp:020}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let key = encode(EntityTag::Selling, &["alice", "asset-1"]).unwrap();
        let (tag, attrs) = decode(&key).unwrap();
        assert_eq!(tag, EntityTag::Selling);
        assert_eq!(attrs, vec!["alice".to_string(), "asset-1".to_string()]);
    }

    #[test]
    fn test_prefix_selects_matching_tuples() {
        let full = encode(EntityTag::Selling, &["alice", "asset-1"]).unwrap();
        let by_seller = prefix(EntityTag::Selling, &["alice"]).unwrap();
        assert!(full.starts_with(&by_seller));

        // "alice" must not match "alice2"; termination prevents it.
        let other = encode(EntityTag::Selling, &["alice2", "asset-1"]).unwrap();
        assert!(!other.starts_with(&by_seller));
    }

    #[test]
    fn test_tags_do_not_collide() {
        let selling = prefix(EntityTag::Selling, &[]).unwrap();
        let mirror = prefix(EntityTag::SellingByBuyer, &[]).unwrap();
        assert!(!mirror.starts_with(&selling));
        assert!(!selling.starts_with(&mirror));
    }

    #[test]
    fn test_empty_attribute_rejected() {
        let err = encode(EntityTag::Account, &[""]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_nul_attribute_rejected() {
        let err = encode(EntityTag::Account, &["a\0b"]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_full_key_requires_attribute() {
        let err = encode(EntityTag::Account, &[]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_decode_rejects_foreign_key() {
        let err = decode(b"plain-key").unwrap_err();
        assert!(matches!(err, LedgerError::Serialization { .. }));

        let key = encode(EntityTag::Account, &["a"]).unwrap();
        let err = decode(&key[..key.len() - 1]).unwrap_err();
        assert!(matches!(err, LedgerError::Serialization { .. }));
    }

    #[test]
    fn test_timestamp_attr_preserves_order() {
        let a = timestamp_attr(9);
        let b = timestamp_attr(10);
        let c = timestamp_attr(100);
        assert!(a < b && b < c);
    }
}
