//! Configuration file for the CLI
//!
//! ```toml
//! namespace = "team-drive"
//! public_keys = ["<hex>", "<hex>", "<hex>"]
//! source_key = "<hex identity of the local source log>"
//! quorum = 2                # optional, defaults to a majority
//! source_timeout_ms = 30000 # optional
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use multisig_core::{Identity, MultisigError, Namespace, PublicKeySet, SignerSet};
use multisig_protocol::{ProtocolConfig, DEFAULT_SOURCE_TIMEOUT};
use serde::{Deserialize, Serialize};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "multisig.toml";

/// Default storage directory
pub const DEFAULT_STORAGE_PATH: &str = "storage";

/// Parsed configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Namespace scoping the destination identity
    #[serde(default)]
    pub namespace: String,
    /// Hex encoded signer public keys
    #[serde(default)]
    pub public_keys: Vec<String>,
    /// Hex identity of the source log (or source tree metadata log)
    pub source_key: Option<String>,
    /// Quorum override
    pub quorum: Option<usize>,
    /// How long to wait for the source, in milliseconds
    pub source_timeout_ms: Option<u64>,
}

impl CliConfig {
    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parse and validate configuration text
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> multisig_core::Result<()> {
        if self.namespace.is_empty() {
            return Err(MultisigError::config("namespace is missing or empty"));
        }
        if self.public_keys.is_empty() {
            return Err(MultisigError::config("public_keys is missing or empty"));
        }
        if self.source_key.is_none() {
            return Err(MultisigError::config("source_key is missing"));
        }
        Ok(())
    }

    /// Namespace and canonical key set
    pub fn signer_set(&self) -> multisig_core::Result<SignerSet> {
        let namespace = Namespace::new(self.namespace.clone())?;
        let keys = PublicKeySet::from_hex(&self.public_keys)?;
        Ok(SignerSet::new(namespace, keys))
    }

    /// Identity of the configured source
    pub fn source(&self) -> multisig_core::Result<Identity> {
        let key = self
            .source_key
            .as_deref()
            .ok_or_else(|| MultisigError::config("source_key is missing"))?;
        Identity::from_hex(key)
    }

    /// Protocol settings, with an optional timeout override in milliseconds
    pub fn protocol(&self, timeout_ms: Option<u64>) -> ProtocolConfig {
        let source_timeout = timeout_ms
            .or(self.source_timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SOURCE_TIMEOUT);
        ProtocolConfig {
            quorum: self.quorum,
            source_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn text(extra: &str) -> String {
        format!(
            "namespace = \"ns1\"\npublic_keys = [\"{KEY}\"]\nsource_key = \"{}\"\n{extra}",
            "11".repeat(32)
        )
    }

    #[test]
    fn test_parse_defaults() {
        let config = CliConfig::parse(&text("")).unwrap();
        assert_eq!(config.quorum, None);
        assert_eq!(config.protocol(None).source_timeout, DEFAULT_SOURCE_TIMEOUT);
        assert_eq!(config.source().unwrap(), Identity::from_bytes([0x11; 32]));
        assert_eq!(config.signer_set().unwrap().keys().len(), 1);
    }

    #[test]
    fn test_timeout_precedence() {
        let config = CliConfig::parse(&text("source_timeout_ms = 500")).unwrap();
        assert_eq!(config.protocol(None).source_timeout, Duration::from_millis(500));
        assert_eq!(config.protocol(Some(7)).source_timeout, Duration::from_millis(7));
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert!(CliConfig::parse("namespace = \"ns1\"").is_err());
        assert!(CliConfig::parse(&format!("public_keys = [\"{KEY}\"]")).is_err());
        let no_source = format!("namespace = \"ns1\"\npublic_keys = [\"{KEY}\"]");
        assert!(CliConfig::parse(&no_source).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);
        std::fs::write(&path, text("quorum = 1")).unwrap();
        assert_eq!(CliConfig::load(&path).unwrap().quorum, Some(1));
        assert!(CliConfig::load(dir.path().join("absent.toml")).is_err());
    }
}
