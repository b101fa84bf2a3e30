//! Error types for ethsigner

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    MalformedEncoding(String),
    InvalidField(String),
    InvalidRecoveryId(u64),
    InvalidPrivateKey(String),
    InvalidSignature(String),
    InvalidAddress(String),
    MnemonicError(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignerError::MalformedEncoding(msg) => write!(f, "Malformed encoding: {}", msg),
            SignerError::InvalidField(msg) => write!(f, "Invalid field: {}", msg),
            SignerError::InvalidRecoveryId(v) => {
                write!(f, "Invalid recovery id: v value {} does not map to 0 or 1", v)
            }
            SignerError::InvalidPrivateKey(msg) => write!(f, "Invalid private key: {}", msg),
            SignerError::InvalidSignature(msg) => write!(f, "Invalid signature: {}", msg),
            SignerError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            SignerError::MnemonicError(msg) => write!(f, "Mnemonic error: {}", msg),
            SignerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SignerError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for SignerError {}

impl From<std::io::Error> for SignerError {
    fn from(err: std::io::Error) -> Self {
        SignerError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for SignerError {
    fn from(err: toml::de::Error) -> Self {
        SignerError::ConfigError(err.to_string())
    }
}

impl From<hex::FromHexError> for SignerError {
    fn from(err: hex::FromHexError) -> Self {
        SignerError::InvalidField(format!("Invalid hex: {}", err))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SignerError>;
