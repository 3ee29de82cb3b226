//! Unified error type for the multisig protocol
//!
//! Every failure aborts the single operation being performed (build, verify or
//! commit) and is returned to the caller as one of these variants. Nothing in
//! the protocol retries internally.

use crate::hash::Hash32;

/// Error type for all multisig operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultisigError {
    /// Requested length is zero, beyond the source, or otherwise unusable
    #[error("Invalid length: {message}")]
    InvalidLength {
        /// Error message describing the rejected length
        message: String,
    },

    /// The source log cannot be opened or read
    #[error("Source unavailable: {message}")]
    SourceUnavailable {
        /// Error message describing the unavailable source
        message: String,
    },

    /// A bounded wait on a log expired
    #[error("Timeout: {message}")]
    Timeout {
        /// Error message describing what was awaited
        message: String,
    },

    /// Response signed by a key outside the signer set
    #[error("Unknown signer: {public_key}")]
    UnknownSigner {
        /// Hex encoded public key of the rejected signer
        public_key: String,
    },

    /// Response signature or request binding does not verify
    #[error("Invalid signature from {public_key}: {message}")]
    InvalidSignature {
        /// Hex encoded public key of the signer
        public_key: String,
        /// Error message describing the verification failure
        message: String,
    },

    /// Response was produced for a different protocol version
    #[error("Stale version: expected {expected}, got {actual}")]
    StaleVersion {
        /// Version of the request
        expected: u16,
        /// Version carried by the response
        actual: u16,
    },

    /// Fewer distinct valid signers than the quorum requires
    #[error("Insufficient quorum: {valid} valid signers, {required} required")]
    InsufficientQuorum {
        /// Distinct valid signers counted
        valid: usize,
        /// Quorum threshold
        required: usize,
    },

    /// Source tree hash no longer matches the signed content hash
    #[error("Hash mismatch at length {length}: expected {expected}, found {actual}")]
    HashMismatch {
        /// Length at which the hash was recomputed
        length: u64,
        /// Hash carried by the request
        expected: Hash32,
        /// Hash recomputed from the source
        actual: Hash32,
    },

    /// Destination is not in a state the request can be applied to
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message describing the rejected state
        message: String,
    },

    /// A commit left the destination different from what was planned
    #[error("Partial apply detected: {message}")]
    PartialApplyDetected {
        /// Error message describing the divergence
        message: String,
    },

    /// Token or payload could not be encoded or decoded
    #[error("Codec error: {message}")]
    Codec {
        /// Error message describing the codec failure
        message: String,
    },

    /// Signer set, quorum or key material is malformed
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Log storage failed for a reason not covered above
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },
}

impl MultisigError {
    /// Create an invalid length error
    pub fn invalid_length(message: impl Into<String>) -> Self {
        Self::InvalidLength {
            message: message.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create an unknown signer error
    pub fn unknown_signer(public_key: impl Into<String>) -> Self {
        Self::UnknownSigner {
            public_key: public_key.into(),
        }
    }

    /// Create an invalid signature error
    pub fn invalid_signature(public_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSignature {
            public_key: public_key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a partial apply error
    pub fn partial_apply(message: impl Into<String>) -> Self {
        Self::PartialApplyDetected {
            message: message.into(),
        }
    }

    /// Create a codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Standard Result type for multisig operations
pub type Result<T> = std::result::Result<T, MultisigError>;

impl From<bincode::Error> for MultisigError {
    fn from(err: bincode::Error) -> Self {
        Self::codec(err.to_string())
    }
}

impl From<base64::DecodeError> for MultisigError {
    fn from(err: base64::DecodeError) -> Self {
        Self::codec(format!("invalid token text: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MultisigError::invalid_state("destination is empty");
        assert!(matches!(err, MultisigError::InvalidState { .. }));
        assert_eq!(err.to_string(), "Invalid state: destination is empty");

        let err = MultisigError::InsufficientQuorum {
            valid: 1,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient quorum: 1 valid signers, 2 required"
        );
    }

    #[test]
    fn test_codec_conversion() {
        use base64::Engine as _;
        let decode_err = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode("@@@@")
            .unwrap_err();
        let err = MultisigError::from(decode_err);
        assert!(matches!(err, MultisigError::Codec { .. }));
    }
}
