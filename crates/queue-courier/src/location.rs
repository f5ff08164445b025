//! Blob store locations, their ordered fallback sets, and the wire
//! conventions for offloaded bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::error::MalformedPointerError;

#[cfg(test)]
#[path = "location_tests.rs"]
mod tests;

// ============================================================================
// BlobLocation
// ============================================================================

/// One blob store location, identified by region, container, and key.
///
/// Inside a [`BlobLocationSet`] the key acts as a prefix under which
/// offloaded objects are placed. Parsed back from a pointer attribute, the
/// key names one exact object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobLocation {
    pub region: String,
    pub container: String,
    pub key: String,
}

impl BlobLocation {
    /// Create a blob location
    pub fn new(
        region: impl Into<String>,
        container: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            container: container.into(),
            key: key.into(),
        }
    }

    /// Derive the location of an object under this prefix. The sub-path is
    /// appended to the key verbatim, so prefixes normally end with `/`.
    pub fn join_key(&self, sub_path: &str) -> Self {
        Self {
            region: self.region.clone(),
            container: self.container.clone(),
            key: format!("{}{}", self.key, sub_path),
        }
    }

    /// Encode as the `region:container:key` pointer format carried by the
    /// reserved message attribute
    pub fn to_pointer(&self) -> String {
        format!("{}:{}:{}", self.region, self.container, self.key)
    }

    /// Parse the `region:container:key` pointer format.
    ///
    /// Only the first two colons delimit fields. Region and container must
    /// be non-empty; the key may contain colons and slashes and may be
    /// empty. Anything else is malformed.
    pub fn parse_pointer(value: &str) -> Result<Self, MalformedPointerError> {
        let mut parts = value.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(region), Some(container), Some(key))
                if !region.is_empty() && !container.is_empty() =>
            {
                Ok(Self::new(region, container, key))
            }
            _ => Err(MalformedPointerError {
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.region, self.container, self.key)
    }
}

impl FromStr for BlobLocation {
    type Err = MalformedPointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_pointer(s)
    }
}

// ============================================================================
// BlobLocationSet
// ============================================================================

/// Non-empty ordered set of blob location prefixes.
///
/// The first entry is the primary; the rest are backups tried in the order
/// they were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobLocationSet {
    locations: Vec<BlobLocation>,
}

impl BlobLocationSet {
    /// Create a set containing only the primary location
    pub fn new(primary: BlobLocation) -> Self {
        Self {
            locations: vec![primary],
        }
    }

    /// Append a backup location, keeping priority order
    pub fn with_backup(mut self, backup: BlobLocation) -> Self {
        self.locations.push(backup);
        self
    }

    /// Get the primary location
    pub fn primary(&self) -> &BlobLocation {
        &self.locations[0]
    }

    /// Get the backup locations in priority order
    pub fn backups(&self) -> &[BlobLocation] {
        &self.locations[1..]
    }

    /// Get all locations in priority order, primary first
    pub fn locations(&self) -> &[BlobLocation] {
        &self.locations
    }

    /// Resolve the candidate object locations for one offloaded body by
    /// appending the sub-path to every prefix, preserving priority order
    pub fn resolve(&self, sub_path: &str) -> BlobLocationSet {
        BlobLocationSet {
            locations: self
                .locations
                .iter()
                .map(|location| location.join_key(sub_path))
                .collect(),
        }
    }
}

// ============================================================================
// Offload Sub-Paths
// ============================================================================

/// Sub-path for an offloaded body: the given date as `YYYYMMDD`, a slash,
/// and the lowercase hex SHA-256 digest of the body.
///
/// Callers pass the current UTC date. Deriving the path from the content
/// keeps uploads of the same body on the same day at the same key.
pub fn offload_sub_path(date: NaiveDate, body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("{}/{}", date.format("%Y%m%d"), hex::encode(digest))
}
