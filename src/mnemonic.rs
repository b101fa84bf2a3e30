//! BIP-39 phrases as a human-readable backup of a private key.
//!
//! The 32 key bytes are used directly as BIP-39 entropy, giving a 24-word
//! English phrase. No seed derivation is involved.

use crate::crypto::{parse_secret_key, PrivateKey};
use crate::error::{Result, SignerError};
use bip39::{Language, Mnemonic};

fn parse_phrase(phrase: &str) -> Result<Mnemonic> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| SignerError::MnemonicError(format!("Invalid phrase: {}", e)))
}

/// Encodes a valid private key as a 24-word phrase.
pub fn private_key_to_mnemonic(private_key: &[u8]) -> Result<String> {
    let secret_key = parse_secret_key(private_key)?;
    let mnemonic = Mnemonic::from_entropy(&secret_key.secret_bytes())
        .map_err(|e| SignerError::MnemonicError(format!("Cannot encode entropy: {}", e)))?;
    Ok(mnemonic.to_string())
}

/// Decodes a 24-word phrase back into the private key it encodes.
pub fn private_key_from_mnemonic(phrase: &str) -> Result<PrivateKey> {
    let entropy = parse_phrase(phrase)?.to_entropy();
    let secret_key = parse_secret_key(&entropy).map_err(|_| {
        SignerError::MnemonicError(format!(
            "Phrase encodes {} bytes of entropy that are not a valid private key",
            entropy.len()
        ))
    })?;
    Ok(secret_key.secret_bytes())
}

/// True iff the phrase has valid words, length and checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_phrase(phrase).is_ok()
}
