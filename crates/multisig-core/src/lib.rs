//! Multisig Core - identities, capabilities and signing tokens
//!
//! This crate holds the pure parts of the quorum-signing protocol:
//!
//! - **Identity Deriver**: [`derive_identity`] turns a namespace and an ordered
//!   set of signer keys into the destination log's address
//! - **Signer capabilities**: [`derive_capability`] binds a signer's secret
//!   seed to one destination so it can answer requests
//! - **Tokens**: [`SigningRequest`] and [`SigningResponse`] with their compact
//!   binary encoding and copy/paste transport text
//! - **Tree hash**: the content hash a request commits to
//!
//! Nothing here touches storage or the network.

#![forbid(unsafe_code)]

/// Signer capabilities derived from secret seeds
pub mod capability;

/// Token transport encoding
pub mod codec;

/// Unified error handling
pub mod errors;

/// Blake3 hashing helpers
pub mod hash;

/// Hex serde for byte types
pub mod hex_serde;

/// Namespaces, signer sets and identity derivation
pub mod identity;

/// Merkle tree hash over log entries
pub mod merkle;

/// Signing requests
pub mod request;

/// Signer responses
pub mod response;

pub use capability::{derive_capability, SignerCapability, SignerSecret};
pub use codec::Token;
pub use errors::{MultisigError, Result};
pub use hash::Hash32;
pub use identity::{
    derive_identity, derive_tree_identity, Identity, Namespace, PublicKey, PublicKeySet,
    SignerSet, TreeIdentity,
};
pub use merkle::tree_hash;
pub use request::{LogTarget, SigningRequest, PROTOCOL_VERSION};
pub use response::{signable, SigningResponse};

/// A single log entry
pub type Entry = Vec<u8>;
