use std::path::Path;

use anyhow::Context as _;
use multisig_core::{Identity, SigningRequest, SigningResponse, Token};
use multisig_log::FileStore;
use multisig_protocol::Multisig;
use serde::Serialize;

use crate::config::CliConfig;

/// Everything a protocol command needs
pub struct Context {
    /// Validated configuration
    pub config: CliConfig,
    /// Local log storage
    pub store: FileStore,
    /// Signer set bound to its protocol settings
    pub multisig: Multisig,
}

impl Context {
    /// Load the config, open the store and validate the quorum
    pub async fn open(
        config_path: impl AsRef<Path>,
        storage: impl AsRef<Path>,
        timeout_ms: Option<u64>,
    ) -> anyhow::Result<Self> {
        let config = CliConfig::load(config_path)?;
        Self::from_config(config, storage, timeout_ms).await
    }

    /// Build a context from an already loaded config
    pub async fn from_config(
        config: CliConfig,
        storage: impl AsRef<Path>,
        timeout_ms: Option<u64>,
    ) -> anyhow::Result<Self> {
        let storage = storage.as_ref();
        let store = FileStore::open(storage)
            .await
            .with_context(|| format!("opening storage {}", storage.display()))?;
        let multisig = Multisig::new(config.signer_set()?, config.protocol(timeout_ms))?;
        Ok(Self {
            config,
            store,
            multisig,
        })
    }

    /// Configured source identity
    pub fn source(&self) -> anyhow::Result<Identity> {
        Ok(self.config.source()?)
    }
}

/// Request summary printed alongside the transport token
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutput {
    /// Destination identity the request will be committed to
    pub destination: Identity,
    /// Responses needed
    pub quorum: usize,
    /// Size of the signer set
    pub signers: usize,
    /// The request itself
    pub request: SigningRequest,
    /// Transport text of the request
    #[serde(skip)]
    pub token: String,
}

impl RequestOutput {
    /// Summarize a freshly built request
    pub fn new(multisig: &Multisig, request: SigningRequest) -> anyhow::Result<Self> {
        Ok(Self {
            destination: multisig.identity(),
            quorum: multisig.quorum(),
            signers: multisig.signers().keys().len(),
            token: request.to_token_string()?,
            request,
        })
    }
}

/// Decode a request token
pub fn decode_request(token: &str) -> anyhow::Result<SigningRequest> {
    SigningRequest::from_token_string(token).context("decoding request token")
}

/// Decode response tokens, naming the first that fails
pub fn decode_responses(tokens: &[String]) -> anyhow::Result<Vec<SigningResponse>> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            SigningResponse::from_token_string(token)
                .with_context(|| format!("decoding response token #{}", i + 1))
        })
        .collect()
}
