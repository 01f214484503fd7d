//! Checkpoint and lineage identifiers

use crate::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a full checkpoint id in hex characters
pub const ID_HEX_LEN: usize = 40;

/// Shortest prefix accepted when resolving abbreviated ids
pub const MIN_PREFIX_LEN: usize = 4;

/// Length of the abbreviated form used in human-readable output
pub const SHORT_ID_LEN: usize = 7;

/// Content-derived checkpoint identifier (the backend commit id, 20 bytes)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CheckpointId([u8; 20]);

impl CheckpointId {
    /// Create a new CheckpointId from raw bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the id as a byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a full 40-character hex string
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != ID_HEX_LEN {
            return Err(CoreError::InvalidCheckpointId(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| CoreError::InvalidCheckpointId(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Abbreviated form for display (first 7 hex characters)
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_ID_LEN);
        hex
    }

    /// Whether this id starts with the given hex prefix (case-insensitive)
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(&prefix.to_ascii_lowercase())
    }
}

/// Check that `prefix` can address a checkpoint: 4..=40 hex characters
pub fn validate_prefix(prefix: &str) -> Result<(), CoreError> {
    let ok = (MIN_PREFIX_LEN..=ID_HEX_LEN).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(CoreError::InvalidCheckpointPrefix(prefix.to_string()))
    }
}

impl fmt::Debug for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckpointId({})", self.to_hex())
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for CheckpointId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CheckpointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CheckpointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Caller-supplied name of an independent checkpoint timeline
///
/// Lineage names become a single git ref component, so they are restricted
/// to characters that are valid there and may not contain `/`.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineageId(String);

impl LineageId {
    /// Maximum accepted name length in bytes
    pub const MAX_LEN: usize = 200;

    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if let Some(reason) = invalid_reason(&name) {
            return Err(CoreError::InvalidLineageName { name, reason });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("name is empty");
    }
    if name.len() > LineageId::MAX_LEN {
        return Some("name is too long");
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Some("name may not start with '.' or '-'");
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Some("name may not end with '.' or '.lock'");
    }
    if name.contains("..") || name.contains("@{") {
        return Some("name may not contain '..' or '@{'");
    }
    if name
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || "/\\~^:?*[".contains(c))
    {
        return Some("name contains a character not allowed in branch names");
    }
    None
}

impl fmt::Debug for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineageId({})", self.0)
    }
}

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LineageId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LineageId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LineageId> for String {
    fn from(id: LineageId) -> Self {
        id.0
    }
}

impl AsRef<str> for LineageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
