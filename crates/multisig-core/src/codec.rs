//! Transport codec for signing tokens
//!
//! Tokens are compact `bincode` bytes, carried between requester and signers
//! as unpadded URL-safe base64 so they survive copy/paste.

use crate::errors::{MultisigError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Upper bound on an encoded token
pub const MAX_TOKEN_BYTES: u64 = 64 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_TOKEN_BYTES)
        .reject_trailing_bytes()
}

/// A versioned value exchanged between requester and signers
pub trait Token: Serialize + DeserializeOwned {
    /// Human-readable kind, used in error messages
    const KIND: &'static str;

    /// Canonical binary encoding
    fn to_bytes(&self) -> Result<Vec<u8>> {
        options()
            .serialize(self)
            .map_err(|e| MultisigError::codec(format!("encoding {}: {e}", Self::KIND)))
    }

    /// Decode from canonical bytes, rejecting trailing data
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        options()
            .deserialize(bytes)
            .map_err(|e| MultisigError::codec(format!("decoding {}: {e}", Self::KIND)))
    }

    /// Encode as transport text
    fn to_token_string(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_bytes()?))
    }

    /// Decode from transport text
    fn from_token_string(text: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(text.trim())?;
        Self::from_bytes(&bytes)
    }
}
