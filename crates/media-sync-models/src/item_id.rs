use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid identifier length: expected 16 bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid identifier string '{0}'")]
    InvalidString(String),
}

/// Format a raw 16-byte identifier as the canonical 8-4-4-4-12 lowercase hex form.
///
/// Bytes are taken in storage order; no version or variant nibble is checked.
pub fn format_identifier(raw: &[u8]) -> Result<String, IdentifierError> {
    Ok(ItemId::from_slice(raw)?.to_string())
}

/// Parse the canonical hyphenated form (or plain 32 hex digits) back to raw bytes.
pub fn parse_identifier(s: &str) -> Result<[u8; 16], IdentifierError> {
    Uuid::try_parse(s.trim())
        .map(|uuid| *uuid.as_bytes())
        .map_err(|_| IdentifierError::InvalidString(s.to_string()))
}

/// Internal identifier of a target library item (stored as a 16-byte blob).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, IdentifierError> {
        Uuid::from_slice(raw)
            .map(Self)
            .map_err(|_| IdentifierError::InvalidLength(raw.len()))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
