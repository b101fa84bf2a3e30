//! secp256k1 key material: private-key generation and validation, public-key
//! derivation and format conversion.

use crate::address::{address_from_uncompressed, Address};
use crate::error::{Result, SignerError};
use crate::units::strip_hex_prefix;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use secp256k1::{
    constants::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE},
    All, PublicKey, Secp256k1, SecretKey,
};

/// A thread-safe, lazily initialized Secp256k1 context shared by every
/// signing, recovery and derivation call.
pub(crate) static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Upper bound on random draws before key generation gives up. A single draw
/// fails with probability below 2^-127, so hitting this means the random
/// source is broken.
pub const MAX_KEYGEN_ATTEMPTS: usize = 128;

/// Raw private key bytes.
pub type PrivateKey = [u8; SECRET_KEY_SIZE];

/// Uncompressed SEC1 public key: `0x04 || X || Y`.
pub type UncompressedPublicKey = [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE];

/// Draws a fresh private key from the operating system's CSPRNG.
pub fn generate_private_key() -> Result<PrivateKey> {
    generate_private_key_with(&mut OsRng)
}

/// Draws 32 random bytes until they form a valid scalar (non-zero and below
/// the group order). Out-of-range draws are discarded rather than reduced so
/// the result stays uniform.
pub fn generate_private_key_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<PrivateKey> {
    let mut candidate = [0u8; SECRET_KEY_SIZE];
    for attempt in 1..=MAX_KEYGEN_ATTEMPTS {
        rng.try_fill_bytes(&mut candidate).map_err(|e| {
            SignerError::InvalidPrivateKey(format!("Random source failed: {}", e))
        })?;
        if verify_private_key(&candidate) {
            if attempt > 1 {
                tracing::debug!("private key accepted after {} draws", attempt);
            }
            return Ok(candidate);
        }
    }
    Err(SignerError::InvalidPrivateKey(format!(
        "No valid scalar after {} random draws",
        MAX_KEYGEN_ATTEMPTS
    )))
}

/// True iff `key` is 32 bytes encoding a scalar in `[1, n)`.
pub fn verify_private_key(key: &[u8]) -> bool {
    key.len() == SECRET_KEY_SIZE && SecretKey::from_slice(key).is_ok()
}

pub(crate) fn parse_secret_key(bytes: &[u8]) -> Result<SecretKey> {
    SecretKey::from_slice(bytes).map_err(|e| {
        if bytes.len() != SECRET_KEY_SIZE {
            SignerError::InvalidPrivateKey(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            ))
        } else {
            SignerError::InvalidPrivateKey(format!("Invalid secret key bytes: {}", e))
        }
    })
}

/// Parses a private key from hex, with or without a `0x` prefix.
pub fn private_key_from_hex(hex_str: &str) -> Result<PrivateKey> {
    let trimmed = hex_str.trim();
    let digits = strip_hex_prefix(trimmed);
    let bytes = hex::decode(digits)
        .map_err(|e| SignerError::InvalidPrivateKey(format!("Invalid hex: {}", e)))?;
    let secret_key = parse_secret_key(&bytes)?;
    Ok(secret_key.secret_bytes())
}

/// Derives the uncompressed public key for `private_key`.
pub fn derive_public_key(private_key: &[u8]) -> Result<UncompressedPublicKey> {
    let secret_key = parse_secret_key(private_key)?;
    Ok(PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key).serialize_uncompressed())
}

/// Re-serializes a SEC1 public key (33 or 65 bytes) in the requested form.
pub fn public_key_convert(public_key: &[u8], compressed: bool) -> Result<Vec<u8>> {
    let key = parse_public_key(public_key)?;
    Ok(if compressed {
        key.serialize().to_vec()
    } else {
        key.serialize_uncompressed().to_vec()
    })
}

pub(crate) fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    if bytes.len() != PUBLIC_KEY_SIZE && bytes.len() != UNCOMPRESSED_PUBLIC_KEY_SIZE {
        return Err(SignerError::InvalidSignature(format!(
            "Public key must be {} or {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            UNCOMPRESSED_PUBLIC_KEY_SIZE,
            bytes.len()
        )));
    }
    PublicKey::from_slice(bytes)
        .map_err(|e| SignerError::InvalidSignature(format!("Invalid public key: {}", e)))
}

/// A private key together with its derived public key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Result<Self> {
        let private_key = generate_private_key()?;
        Self::from_secret_bytes(&private_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_secret_key(parse_secret_key(bytes)?))
    }

    pub fn private_key(&self) -> PrivateKey {
        self.secret_key.secret_bytes()
    }

    pub fn public_key_uncompressed(&self) -> UncompressedPublicKey {
        self.public_key.serialize_uncompressed()
    }

    /// The 20-byte account address controlled by this key.
    pub fn address(&self) -> Address {
        address_from_uncompressed(&self.public_key_uncompressed())
    }
}
