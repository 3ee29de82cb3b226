//! Hash function abstractions for content addressing
//!
//! Provides the Blake3 helpers used for request hashes, tree hashes and
//! identity derivation.

use blake3::Hasher;
use crate::hex_serde::impl_bytes32_serde;
use std::fmt;

/// 32-byte Blake3 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash32(pub [u8; 32]);

impl_bytes32_serde!(Hash32);

impl Hash32 {
    /// Wrap raw digest bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim()).ok()?;
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", &self.to_hex()[..16])
    }
}

impl From<blake3::Hash> for Hash32 {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

/// Create a Blake3 hash of the input data
pub fn hash(data: &[u8]) -> Hash32 {
    blake3::hash(data).into()
}

/// Hash multiple data chunks with Blake3
pub fn hash_chunks(chunks: &[&[u8]]) -> Hash32 {
    let mut hasher = Hasher::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}

/// Hash chunks under a Blake3 key-derivation context
///
/// Different contexts never collide, which gives each protocol value its own
/// domain without hand-rolled prefixes.
pub fn derive(context: &str, chunks: &[&[u8]]) -> Hash32 {
    let mut hasher = Hasher::new_derive_key(context);
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}
