//! # Block Identity
//!
//! A block header is identified by a 32-byte content hash. KEEL hashes
//! headers with BLAKE3 — fast on every platform that matters, and with
//! security margins comparable to SHA-256.
//!
//! The index never computes hashes itself; it treats [`BlockHash`] as an
//! opaque identity supplied by the header-construction collaborator. The
//! [`BlockHash::digest`] helper exists for that collaborator (and for tests
//! and benches) so everyone derives identities the same way.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// 32-byte identity of a block header.
///
/// Displayed and serialized as lowercase hex, because nobody wants to read
/// `[18, 52, 86, ...]` in a log line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// The all-zero hash. Conventionally the "parent" of genesis.
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);

    /// Wrap raw bytes as a block hash.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }

    /// Compute the BLAKE3 digest of `data` as a block hash.
    pub fn digest(data: &[u8]) -> Self {
        BlockHash(*blake3::hash(data).as_bytes())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Eight hex chars is plenty to tell headers apart in test output.
        write!(f, "BlockHash({}..)", &self.to_hex()[..8])
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }
}

impl FromStr for BlockHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(BlockHash(bytes))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
