/// Transaction types for ethsigner
use serde::{Deserialize, Serialize};

/// Maximum encoded data payload accepted for signing (128KB)
pub const MAX_DATA_SIZE: usize = 128 * 1024;

/// Byte width of a 256-bit quantity
pub const MAX_QUANTITY_BYTES: usize = 32;

/// How a field's bytes are interpreted when building the signing pre-image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned big-endian integer; leading zero bytes are not canonical
    Quantity,
    /// Opaque byte string kept as written
    Bytes,
}

/// An outgoing legacy transaction.
///
/// Every field is a hex string (optional `0x`, odd lengths allowed).
/// Field order is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
    /// Recipient address; empty for contract creation
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub data: String,
    pub chain_id: String,
}

impl Transaction {
    /// The six fields that end up in the signed encoding, with their names
    /// and kinds, in wire order.
    pub fn unsigned_field_specs(&self) -> [(&'static str, &str, FieldKind); 6] {
        [
            ("nonce", self.nonce.as_str(), FieldKind::Quantity),
            ("gasPrice", self.gas_price.as_str(), FieldKind::Quantity),
            ("gasLimit", self.gas_limit.as_str(), FieldKind::Quantity),
            ("to", self.to.as_str(), FieldKind::Bytes),
            ("value", self.value.as_str(), FieldKind::Quantity),
            ("data", self.data.as_str(), FieldKind::Bytes),
        ]
    }
}
