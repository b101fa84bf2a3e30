/// Field normalization and validation, separated from the type definitions
use crate::address::ADDRESS_LENGTH;
use crate::error::{Result, SignerError};
use crate::rlp::RawValue;
use crate::transaction::types::{FieldKind, Transaction, MAX_DATA_SIZE, MAX_QUANTITY_BYTES};
use crate::units::strip_hex_prefix;

/// Decodes a hex field, left-padding odd-length input with a zero nibble.
///
/// `""` and `"00"` (after padding) normalize to the empty byte string; a
/// quantity additionally loses its leading zero bytes, so any all-zero
/// quantity is empty too.
pub fn normalize_field(name: &str, value: &str, kind: FieldKind) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let digits = strip_hex_prefix(trimmed);
    let padded = if digits.len() % 2 != 0 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    let bytes = hex::decode(&padded).map_err(|e| {
        SignerError::InvalidField(format!("{}: invalid hex {:?}: {}", name, value, e))
    })?;

    let normalized = match kind {
        FieldKind::Quantity => {
            let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
            bytes[leading_zeros..].to_vec()
        }
        FieldKind::Bytes if bytes == [0u8] => Vec::new(),
        FieldKind::Bytes => bytes,
    };
    Ok(normalized)
}

/// Renders a quantity as its minimal big-endian byte string (zero is empty).
pub fn quantity_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[leading_zeros..].to_vec()
}

impl Transaction {
    /// Normalized unsigned fields in wire order:
    /// `nonce, gasPrice, gasLimit, to, value, data`.
    pub fn unsigned_fields(&self) -> Result<Vec<RawValue>> {
        self.validate()?;
        self.unsigned_field_specs()
            .into_iter()
            .map(|(name, value, kind)| normalize_field(name, value, kind).map(RawValue::Bytes))
            .collect()
    }

    /// The chain identifier as a minimal big-endian byte string.
    pub fn chain_id_bytes(&self) -> Result<Vec<u8>> {
        normalize_field("chainId", &self.chain_id, FieldKind::Quantity)
    }

    /// The chain identifier as an integer; must fit in 64 bits.
    pub fn chain_id_value(&self) -> Result<u64> {
        let bytes = self.chain_id_bytes()?;
        if bytes.len() > 8 {
            return Err(SignerError::InvalidField(format!(
                "chainId: {} bytes exceeds 64-bit range",
                bytes.len()
            )));
        }
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Checks every field's shape without producing the encoding.
    pub fn validate(&self) -> Result<()> {
        for (name, value, kind) in self.unsigned_field_specs() {
            let bytes = normalize_field(name, value, kind)?;
            match (name, kind) {
                ("to", _) if !bytes.is_empty() && bytes.len() != ADDRESS_LENGTH => {
                    return Err(SignerError::InvalidField(format!(
                        "to: address must be {} bytes, got {}",
                        ADDRESS_LENGTH,
                        bytes.len()
                    )));
                }
                ("data", _) if bytes.len() > MAX_DATA_SIZE => {
                    return Err(SignerError::InvalidField(format!(
                        "data: {} bytes exceeds maximum {}",
                        bytes.len(),
                        MAX_DATA_SIZE
                    )));
                }
                (_, FieldKind::Quantity) if bytes.len() > MAX_QUANTITY_BYTES => {
                    return Err(SignerError::InvalidField(format!(
                        "{}: {} bytes exceeds 256-bit range",
                        name,
                        bytes.len()
                    )));
                }
                _ => {}
            }
        }
        self.chain_id_value()?;
        Ok(())
    }
}
