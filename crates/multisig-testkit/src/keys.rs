//! Deterministic signer fixtures

use multisig_core::{
    derive_capability, Namespace, PublicKey, PublicKeySet, SignerCapability, SignerSecret,
    SignerSet, SigningRequest, SigningResponse,
};

/// `n` signers with seeds `[1; 32]`, `[2; 32]`, ... under one namespace
///
/// Signer `i` always has the same key, so two fixtures of different sizes
/// share their first signers.
#[derive(Debug, Clone)]
pub struct TestSigners {
    namespace: Namespace,
    secrets: Vec<SignerSecret>,
    set: SignerSet,
}

impl TestSigners {
    /// Create `n` signers under `namespace`
    pub fn new(namespace: &str, n: usize) -> Self {
        assert!(n > 0 && n < 255, "signer count out of fixture range");
        let namespace = Namespace::new(namespace).expect("test namespace");
        let secrets: Vec<SignerSecret> = (0..n)
            .map(|i| SignerSecret::from_bytes([i as u8 + 1; 32]))
            .collect();
        let keys = PublicKeySet::new(secrets.iter().map(|s| s.public_key().expect("seed key")))
            .expect("distinct test keys");
        let set = SignerSet::new(namespace.clone(), keys);
        Self {
            namespace,
            secrets,
            set,
        }
    }

    /// Number of signers
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Always false
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Signer set with its derived identity
    pub fn set(&self) -> SignerSet {
        self.set.clone()
    }

    /// Secret seed of signer `i`
    pub fn secret(&self, i: usize) -> &SignerSecret {
        &self.secrets[i]
    }

    /// Public key of signer `i`
    pub fn public_key(&self, i: usize) -> PublicKey {
        self.secrets[i].public_key().expect("seed key")
    }

    /// Keys in the order signers were created
    pub fn public_keys(&self) -> Vec<PublicKey> {
        (0..self.len()).map(|i| self.public_key(i)).collect()
    }

    /// Capability of signer `i` over this set's destination
    pub fn capability(&self, i: usize) -> SignerCapability {
        derive_capability(&self.secrets[i], &self.namespace, self.set.keys())
            .expect("member capability")
    }

    /// Response of signer `i`
    pub fn respond(&self, i: usize, request: &SigningRequest) -> SigningResponse {
        self.capability(i).sign(request).expect("sign request")
    }

    /// Responses of the listed signers, in order
    pub fn responses(&self, request: &SigningRequest, signers: &[usize]) -> Vec<SigningResponse> {
        signers.iter().map(|&i| self.respond(i, request)).collect()
    }
}
