//! Configuration management for ethsigner

use crate::error::{Result, SignerError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How the recovery id is folded into the wire `v` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VEncoding {
    /// `v = recovery_id + 27`
    #[default]
    Legacy,
    /// `v = recovery_id + chain_id * 2 + 35`
    Eip155,
}

/// Engine configuration, passed to [`crate::signer::Signer::new`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignerConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub v_encoding: VEncoding,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            v_encoding: VEncoding::default(),
        }
    }
}

impl SignerConfig {
    pub fn new(chain_id: u64, v_encoding: VEncoding) -> Result<Self> {
        let config = Self {
            chain_id,
            v_encoding,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SignerConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(SignerError::ConfigError(
                "chain_id must be non-zero".to_string(),
            ));
        }
        // v = recovery_id + chain_id * 2 + 35 must fit in u64
        if self.chain_id > (u64::MAX - 36) / 2 {
            return Err(SignerError::ConfigError(format!(
                "chain_id {} is too large",
                self.chain_id
            )));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file; a missing file yields defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<SignerConfig> {
    let path = path.as_ref();
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config at {}, using defaults", path.display());
            String::new()
        }
        Err(e) => return Err(e.into()),
    };
    SignerConfig::from_toml_str(&config_str)
}

fn default_chain_id() -> u64 {
    1
}
