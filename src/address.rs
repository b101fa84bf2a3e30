//! Account addresses and their mixed-case checksum encoding (EIP-55).

use crate::crypto::{parse_public_key, UncompressedPublicKey};
use crate::error::{Result, SignerError};
use crate::hash::keccak256;
use crate::units::strip_hex_prefix;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

const ADDRESS_HEX_LENGTH: usize = ADDRESS_LENGTH * 2;

/// Type alias for the derived address: the low 20 bytes of the Keccak-256
/// hash of the public key.
pub type Address = [u8; ADDRESS_LENGTH];

/// Derives the address of a SEC1 public key in either compressed or
/// uncompressed form.
pub fn public_key_to_address(public_key: &[u8]) -> Result<Address> {
    let key = parse_public_key(public_key)?;
    Ok(address_from_uncompressed(&key.serialize_uncompressed()))
}

/// Hashes the 64 coordinate bytes (format prefix dropped) and keeps the last
/// 20 bytes of the digest.
pub(crate) fn address_from_uncompressed(public_key: &UncompressedPublicKey) -> Address {
    let hash = keccak256(&public_key[1..]);
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&hash[32 - ADDRESS_LENGTH..]);
    address
}

/// Lowercase hex without a `0x` prefix.
pub fn address_to_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Parses 40 hex digits (optional `0x`, any case). Casing is not checked;
/// use [`validate_address_checksum`] for that.
pub fn address_from_hex(hex_str: &str) -> Result<Address> {
    let digits = strip_hex_prefix(hex_str);
    if digits.len() != ADDRESS_HEX_LENGTH {
        return Err(SignerError::InvalidAddress(format!(
            "Address must be {} hex characters, got {}",
            ADDRESS_HEX_LENGTH,
            digits.len()
        )));
    }
    let mut address = [0u8; ADDRESS_LENGTH];
    hex::decode_to_slice(digits, &mut address)
        .map_err(|e| SignerError::InvalidAddress(format!("Invalid hex address: {}", e)))?;
    Ok(address)
}

/// Renders `0x` followed by the checksum-cased address.
pub fn to_checksum_address(addr: &Address) -> String {
    let lower = address_to_hex(addr);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(2 + ADDRESS_HEX_LENGTH);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        if hash_nibble(&hash, i) >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Checks an address string against its checksum casing.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted as long as they are well formed.
pub fn validate_address_checksum(address: &str) -> bool {
    let digits = strip_hex_prefix(address);
    if digits.len() != ADDRESS_HEX_LENGTH || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }

    let hash = keccak256(digits.to_ascii_lowercase().as_bytes());
    digits.bytes().enumerate().all(|(i, b)| {
        if hash_nibble(&hash, i) >= 8 {
            !b.is_ascii_lowercase()
        } else {
            !b.is_ascii_uppercase()
        }
    })
}

/// The `i`-th hex digit of `hash`, most significant nibble first.
fn hash_nibble(hash: &[u8; 32], i: usize) -> u8 {
    let byte = hash[i / 2];
    if i % 2 == 0 {
        byte >> 4
    } else {
        byte & 0x0f
    }
}
