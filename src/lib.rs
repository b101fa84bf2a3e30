//! ethsigner - transaction signing and address derivation for Ethereum-style ledgers
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Encoding
//! - [`rlp`] - Canonical recursive-length prefix serialization
//! - [`hash`] - Keccak-256
//!
//! ## Keys & Addresses
//! - [`crypto`] - Private-key generation and public-key derivation (secp256k1)
//! - [`address`] - Address derivation and checksum casing
//! - [`mnemonic`] - BIP-39 phrase backup of private keys
//!
//! ## Transactions
//! - [`transaction`] - Transaction fields and their normalization
//! - [`signer`] - Signing, replay protection and sender recovery
//! - [`units`] - Hex quantities and ether/wei conversion
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Encoding
// ============================================================================
pub mod hash;
pub mod rlp;

// ============================================================================
// Keys & Addresses
// ============================================================================
pub mod address;
pub mod crypto;
pub mod mnemonic;

// ============================================================================
// Transactions
// ============================================================================
pub mod signer;
pub mod transaction;
pub mod units;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use config::{SignerConfig, VEncoding};
pub use error::{Result, SignerError};
pub use signer::{Signature, Signer};
pub use transaction::Transaction;
