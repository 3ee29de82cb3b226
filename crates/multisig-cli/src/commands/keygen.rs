//! Signer seed generation

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use multisig_core::{PublicKey, SignerSecret};
use serde::Serialize;
use tracing::info;

/// Owner read/write only
const KEY_FILE_MODE: u32 = 0o600;

/// Result of generating a signer seed
#[derive(Debug, Serialize)]
pub struct KeygenOutput {
    /// Public key to list in the signer set
    pub public_key: PublicKey,
    /// File the seed was written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Hex seed, only when no file was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// Generate a new seed, writing it to `out` when given
pub fn run(out: Option<&Path>) -> anyhow::Result<KeygenOutput> {
    let secret = SignerSecret::generate();
    let public_key = secret.public_key()?;

    match out {
        Some(path) => {
            write_key_file(path, secret.to_hex().as_bytes())?;
            info!(%public_key, path = %path.display(), "Wrote signer seed");
            Ok(KeygenOutput {
                public_key,
                key_file: Some(path.to_path_buf()),
                secret_key: None,
            })
        }
        None => Ok(KeygenOutput {
            public_key,
            key_file: None,
            secret_key: Some(secret.to_hex().to_string()),
        }),
    }
}

/// Create `path` with owner-only permissions, failing if it already exists
fn write_key_file(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(KEY_FILE_MODE);
    }
    #[cfg(not(unix))]
    let _ = KEY_FILE_MODE;

    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            anyhow::bail!("refusing to overwrite existing key file {}", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("creating key file {}", path.display()))
        }
    };
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .with_context(|| format!("writing key file {}", path.display()))
}

/// Read a seed written by [`run`]
pub fn read_secret(path: &Path) -> anyhow::Result<SignerSecret> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading key file {}", path.display()))?;
    Ok(SignerSecret::from_hex(&text)?)
}
