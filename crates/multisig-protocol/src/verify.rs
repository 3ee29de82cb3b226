//! Response verification and quorum tally
//!
//! Checks run in a fixed order so a response is always rejected for the same
//! reason: protocol version, signer membership, request binding, then the
//! Ed25519 signature over [`signable`].

use std::collections::BTreeSet;

use multisig_core::{
    signable, MultisigError, PublicKey, Result, SignerSet, SigningRequest, SigningResponse,
};
use serde::Serialize;
use tracing::{debug, warn};

/// A response that passed every check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignerOutcome {
    /// Signer that produced the response
    pub public_key: PublicKey,
}

/// Verify one response against a request and signer set
pub fn verify_response(
    request: &SigningRequest,
    response: &SigningResponse,
    signers: &SignerSet,
) -> Result<SignerOutcome> {
    if response.version != request.version {
        return Err(MultisigError::StaleVersion {
            expected: request.version,
            actual: response.version,
        });
    }

    let public_key = response.public_key;
    if !signers.keys().contains(&public_key) {
        return Err(MultisigError::unknown_signer(public_key.to_hex()));
    }

    let request_hash = request.request_hash()?;
    if response.request_hash != request_hash {
        return Err(MultisigError::invalid_signature(
            public_key.to_hex(),
            "response was produced for a different request",
        ));
    }

    let message = signable(&signers.identity(), &request_hash);
    public_key
        .verifying_key()?
        .verify_strict(message.as_bytes(), &response.signature)
        .map_err(|e| MultisigError::invalid_signature(public_key.to_hex(), e.to_string()))?;

    Ok(SignerOutcome { public_key })
}

/// A response excluded from the tally and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Key the response claimed
    pub public_key: PublicKey,
    /// Reason it was not counted
    pub reason: String,
}

/// Result of counting a batch of responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Distinct signers with a valid response, in key order
    pub signers: Vec<PublicKey>,
    /// Responses that failed verification
    pub rejected: Vec<Rejection>,
    /// Number of distinct valid signers
    pub valid: usize,
    /// Threshold that had to be met
    pub required: usize,
}

impl Tally {
    /// Whether the threshold is met
    pub fn is_satisfied(&self) -> bool {
        self.valid >= self.required
    }

    /// Fail with `InsufficientQuorum` unless the threshold is met
    pub fn require(&self) -> Result<()> {
        if self.is_satisfied() {
            Ok(())
        } else {
            Err(MultisigError::InsufficientQuorum {
                valid: self.valid,
                required: self.required,
            })
        }
    }
}

/// Count distinct valid signers among `responses`
///
/// Invalid responses are recorded but never abort the tally. Several valid
/// responses from one key count once.
pub fn tally(
    request: &SigningRequest,
    responses: &[SigningResponse],
    signers: &SignerSet,
    required: usize,
) -> Tally {
    let mut valid = BTreeSet::new();
    let mut rejected = Vec::new();

    for response in responses {
        match verify_response(request, response, signers) {
            Ok(outcome) => {
                if !valid.insert(outcome.public_key) {
                    debug!(signer = %outcome.public_key, "Ignoring duplicate response");
                }
            }
            Err(err) => {
                warn!(signer = %response.public_key, error = %err, "Rejected response");
                rejected.push(Rejection {
                    public_key: response.public_key,
                    reason: err.to_string(),
                });
            }
        }
    }

    Tally {
        valid: valid.len(),
        signers: valid.into_iter().collect(),
        rejected,
        required,
    }
}
