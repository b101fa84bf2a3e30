//! Keccak-256, the one hash used for transaction digests and addresses.

use sha3::{Digest, Keccak256};

/// A 32-byte Keccak-256 digest.
pub type Hash32 = [u8; 32];

pub fn keccak256(data: &[u8]) -> Hash32 {
    Keccak256::digest(data).into()
}
