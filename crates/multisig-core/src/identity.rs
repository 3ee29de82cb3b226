//! Signer sets and destination identity derivation
//!
//! A destination log is addressed by an [`Identity`] that is a pure function of
//! a [`Namespace`] and the canonical (sorted, duplicate-free) [`PublicKeySet`].
//! The order in which a caller lists the keys never affects the result;
//! changing the namespace or any single key yields an unrelated identity.

use crate::errors::{MultisigError, Result};
use crate::hash::{derive, Hash32};
use crate::hex_serde::impl_bytes32_serde;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;

const IDENTITY_CONTEXT: &str = "multisig 2024 destination identity v1";
const CONTENT_COMPANION_CONTEXT: &str = "multisig 2024 tree content identity v1";

/// Domain-separation string scoping one signer set's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Namespace(String);

impl TryFrom<String> for Namespace {
    type Error = MultisigError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl Namespace {
    /// Create a namespace, rejecting the empty string
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(MultisigError::config("namespace must not be empty"));
        }
        Ok(Self(value))
    }

    /// Namespace as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32-byte Ed25519 public key of one signer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 32]);

impl_bytes32_serde!(PublicKey);

impl PublicKey {
    /// Wrap raw key bytes, checking they encode a valid curve point
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| MultisigError::config(format!("invalid public key: {e}")))?;
        Ok(Self(bytes))
    }

    /// Parse a hex encoded public key
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| MultisigError::config(format!("public key is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            MultisigError::config(format!("public key must be 32 bytes, got {}", b.len()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Borrow the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Ed25519 verifying key for signature checks
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|e| MultisigError::invalid_signature(self.to_hex(), e.to_string()))
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// Canonical, duplicate-free set of signer public keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PublicKey>")]
pub struct PublicKeySet(Vec<PublicKey>);

impl TryFrom<Vec<PublicKey>> for PublicKeySet {
    type Error = MultisigError;

    fn try_from(keys: Vec<PublicKey>) -> Result<Self> {
        Self::new(keys)
    }
}

impl PublicKeySet {
    /// Canonicalize a caller-ordered key list
    ///
    /// Keys are stably sorted by their byte encoding. An empty list or a list
    /// naming the same key twice is rejected.
    pub fn new(keys: impl IntoIterator<Item = PublicKey>) -> Result<Self> {
        let mut keys: Vec<PublicKey> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(MultisigError::config("signer set must not be empty"));
        }
        keys.sort();
        if let Some(pair) = keys.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(MultisigError::config(format!(
                "duplicate signer key {}",
                pair[0]
            )));
        }
        Ok(Self(keys))
    }

    /// Parse and canonicalize a list of hex keys
    pub fn from_hex<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        let keys = keys
            .iter()
            .map(|k| PublicKey::from_hex(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys)
    }

    /// Number of signers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership check
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.0.binary_search(key).is_ok()
    }

    /// Keys in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &PublicKey> {
        self.0.iter()
    }

    /// Majority of the set: `n / 2 + 1`
    pub fn majority(&self) -> usize {
        self.0.len() / 2 + 1
    }
}

/// Deterministic address of a log
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl_bytes32_serde!(Identity);

impl Identity {
    /// Wrap raw identity bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a hex encoded identity
    pub fn from_hex(s: &str) -> Result<Self> {
        Hash32::from_hex(s)
            .map(|h| Self(h.0))
            .ok_or_else(|| MultisigError::config(format!("invalid identity: {s}")))
    }

    /// Borrow the identity bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Identity of the content log co-located with this metadata log
    ///
    /// Used for both source and destination trees, so a tree is fully located
    /// by its metadata identity.
    pub fn content_companion(&self) -> Identity {
        Identity(derive(CONTENT_COMPANION_CONTEXT, &[&self.0]).0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..16])
    }
}

/// Identities of the two logs making up a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeIdentity {
    /// Metadata log, also the tree's public key
    pub metadata: Identity,
    /// Content log
    pub content: Identity,
}

/// Derive the destination identity for a namespace and signer set
pub fn derive_identity(namespace: &Namespace, keys: &PublicKeySet) -> Identity {
    let ns = namespace.as_str().as_bytes();
    let ns_len = (ns.len() as u64).to_le_bytes();
    let count = (keys.len() as u64).to_le_bytes();

    let mut chunks: Vec<&[u8]> = Vec::with_capacity(keys.len() + 3);
    chunks.push(&ns_len);
    chunks.push(ns);
    chunks.push(&count);
    chunks.extend(keys.iter().map(|k| k.as_bytes().as_slice()));

    Identity(derive(IDENTITY_CONTEXT, &chunks).0)
}

/// Derive both destination identities of a tree
pub fn derive_tree_identity(namespace: &Namespace, keys: &PublicKeySet) -> TreeIdentity {
    let metadata = derive_identity(namespace, keys);
    TreeIdentity {
        metadata,
        content: metadata.content_companion(),
    }
}

/// A namespace, its canonical signer set and the identity they derive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerSet {
    namespace: Namespace,
    keys: PublicKeySet,
    identity: Identity,
}

impl SignerSet {
    /// Bundle a namespace with its signer set
    pub fn new(namespace: Namespace, keys: PublicKeySet) -> Self {
        let identity = derive_identity(&namespace, &keys);
        Self {
            namespace,
            keys,
            identity,
        }
    }

    /// Namespace of the set
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Canonical keys
    pub fn keys(&self) -> &PublicKeySet {
        &self.keys
    }

    /// Destination identity
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Destination tree identities
    pub fn tree_identity(&self) -> TreeIdentity {
        TreeIdentity {
            metadata: self.identity,
            content: self.identity.content_companion(),
        }
    }
}
