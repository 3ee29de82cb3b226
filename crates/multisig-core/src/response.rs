//! Signer responses

use crate::codec::Token;
use crate::hash::{derive, Hash32};
use crate::identity::{Identity, PublicKey};
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

const SIGNABLE_CONTEXT: &str = "multisig 2024 response signable v1";

/// One signer's answer to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningResponse {
    /// Protocol version the signer produced this response for
    pub version: u16,
    /// Hash of the request bytes the signer saw
    pub request_hash: Hash32,
    /// Key of the signer
    pub public_key: PublicKey,
    /// Ed25519 signature over [`signable`]
    pub signature: Signature,
}

impl Token for SigningResponse {
    const KIND: &'static str = "signing response";
}

/// Payload a signer signs for a request
///
/// Binds the signature to the destination identity (and so to the namespace
/// and signer set) as well as to the exact request instance.
pub fn signable(destination: &Identity, request_hash: &Hash32) -> Hash32 {
    derive(
        SIGNABLE_CONTEXT,
        &[destination.as_bytes(), request_hash.as_bytes()],
    )
}
