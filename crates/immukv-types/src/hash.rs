use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const PREFIX: &str = "sha256:";
const GENESIS: &str = "sha256:genesis";

/// Chain hash of a log entry.
///
/// Always rendered as `sha256:` followed by 64 lowercase hex digits, except
/// for the genesis sentinel `sha256:genesis` that the first entry links to.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryHash(String);

impl EntryHash {
    /// The sentinel previous-hash of the very first entry.
    pub fn genesis() -> Self {
        Self(GENESIS.to_string())
    }

    /// Build from a raw SHA-256 digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(format!("{PREFIX}{}", hex::encode(digest)))
    }

    /// Parse a hash read from a stored document.
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        if s == GENESIS {
            return Ok(Self(s));
        }
        let well_formed = s.strip_prefix(PREFIX).is_some_and(|hex| {
            hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        });
        if !well_formed {
            return Err(TypeError::InvalidHash(s));
        }
        Ok(Self(s))
    }

    pub fn is_genesis(&self) -> bool {
        self.0 == GENESIS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines: the first 8 hex digits.
    pub fn short(&self) -> &str {
        let end = (PREFIX.len() + 8).min(self.0.len());
        &self.0[PREFIX.len()..end]
    }
}

impl TryFrom<String> for EntryHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EntryHash> for String {
    fn from(hash: EntryHash) -> Self {
        hash.0
    }
}

impl fmt::Debug for EntryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryHash({})", self.0)
    }
}

impl fmt::Display for EntryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
