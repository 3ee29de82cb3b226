//! Signer capabilities
//!
//! Each signer holds an independent secret seed. The Ed25519 signing key is
//! derived from the seed with HKDF-SHA256, and a [`SignerCapability`] binds that
//! key to one destination identity. A quorum of `q` therefore needs `q`
//! distinct seeds: no single capability can produce more than one counted
//! response.

use crate::errors::{MultisigError, Result};
use crate::identity::{derive_identity, Identity, Namespace, PublicKey, PublicKeySet};
use crate::request::{SigningRequest, PROTOCOL_VERSION};
use crate::response::{signable, SigningResponse};
use ed25519_dalek::{Signer, SigningKey};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

const KEY_SALT: &[u8] = b"multisig/signer-seed/v1";
const KEY_INFO: &[u8] = b"ed25519 signing key";

/// 32-byte secret seed of one signer
#[derive(Clone)]
pub struct SignerSecret {
    seed: Zeroizing<[u8; 32]>,
}

impl SignerSecret {
    /// Wrap an existing seed
    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
        }
    }

    /// Draw a fresh seed from the operating system RNG
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(seed.as_mut());
        Self { seed }
    }

    /// Parse a hex encoded seed
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(s.trim())
                .map_err(|e| MultisigError::config(format!("secret seed is not hex: {e}")))?,
        );
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            MultisigError::config(format!("secret seed must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bytes(seed))
    }

    /// Hex encoded seed, for writing key files
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.seed[..]))
    }

    fn signing_key(&self) -> Result<SigningKey> {
        let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), self.seed.as_ref());
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(KEY_INFO, okm.as_mut())
            .map_err(|e| MultisigError::config(format!("seed expansion failed: {e}")))?;
        Ok(SigningKey::from_bytes(&okm))
    }

    /// Public key this seed signs with
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(self.signing_key()?.verifying_key().into())
    }
}

impl fmt::Debug for SignerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignerSecret(<redacted>)")
    }
}

/// A signer's key bound to one destination identity
pub struct SignerCapability {
    signing_key: SigningKey,
    public_key: PublicKey,
    destination: Identity,
}

impl SignerCapability {
    /// Public key of the signer
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Destination identity the capability signs for
    pub fn destination(&self) -> Identity {
        self.destination
    }

    /// Produce this signer's response to a request
    pub fn sign(&self, request: &SigningRequest) -> Result<SigningResponse> {
        if request.version != PROTOCOL_VERSION {
            return Err(MultisigError::StaleVersion {
                expected: PROTOCOL_VERSION,
                actual: request.version,
            });
        }

        let request_hash = request.request_hash()?;
        let message = signable(&self.destination, &request_hash);
        let signature = self.signing_key.sign(message.as_bytes());

        tracing::debug!(
            signer = %self.public_key,
            destination = %self.destination,
            length = request.target_length(),
            "Signed request"
        );

        Ok(SigningResponse {
            version: request.version,
            request_hash,
            public_key: self.public_key,
            signature,
        })
    }
}

impl fmt::Debug for SignerCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerCapability")
            .field("public_key", &self.public_key)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

/// Derive the capability a seed holds over a signer set's destination
///
/// Fails with `UnknownSigner` when the seed's key is not a member of the set.
pub fn derive_capability(
    secret: &SignerSecret,
    namespace: &Namespace,
    keys: &PublicKeySet,
) -> Result<SignerCapability> {
    let signing_key = secret.signing_key()?;
    let public_key = PublicKey::from(signing_key.verifying_key());
    if !keys.contains(&public_key) {
        return Err(MultisigError::unknown_signer(public_key.to_hex()));
    }

    Ok(SignerCapability {
        signing_key,
        public_key,
        destination: derive_identity(namespace, keys),
    })
}
