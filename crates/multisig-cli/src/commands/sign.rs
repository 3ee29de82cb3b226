//! Answering a request as one signer

use std::path::Path;

use multisig_core::Token;
use multisig_protocol::{Multisig, ProtocolConfig};
use tracing::info;

use super::common::decode_request;
use super::keygen::read_secret;
use crate::config::CliConfig;

/// Sign `request` with the seed in `key_path`, returning the response token
pub fn run(config: &CliConfig, request: &str, key_path: &Path) -> anyhow::Result<String> {
    let multisig = Multisig::new(config.signer_set()?, ProtocolConfig::default())?;
    let request = decode_request(request)?;
    let secret = read_secret(key_path)?;

    let response = multisig.respond(&secret, &request)?;
    info!(
        signer = %response.public_key,
        destination = %multisig.identity(),
        length = request.target_length(),
        "Signed request"
    );
    Ok(response.to_token_string()?)
}
