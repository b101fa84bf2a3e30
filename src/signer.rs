//! Transaction signing and sender recovery.
//!
//! The signing pre-image is always the six unsigned fields followed by the
//! chain id and two empty placeholders for `r` and `s`. The signed encoding
//! replaces those three trailing items with the real `v`, `r` and `s`. Both
//! lists are built fresh from the unsigned fields; neither is derived by
//! editing the other.

use crate::address::{address_from_uncompressed, Address};
use crate::config::{SignerConfig, VEncoding};
use crate::crypto::{parse_public_key, parse_secret_key, UncompressedPublicKey, SECP256K1_CONTEXT};
use crate::error::{Result, SignerError};
use crate::hash::{keccak256, Hash32};
use crate::rlp::{self, RawValue};
use crate::transaction::{quantity_bytes, Transaction};
use crate::units::strip_hex_prefix;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature as EcdsaSignature};
use secp256k1::Message;

/// Offset added to the recovery id by the legacy encoding.
pub const LEGACY_V_OFFSET: u64 = 27;

/// Offset added to `recovery_id + chain_id * 2` by the EIP-155 encoding.
pub const EIP155_V_OFFSET: u64 = 35;

/// Unsigned fields in a legacy transaction.
pub const UNSIGNED_FIELD_COUNT: usize = 6;

/// Trailing items that carry the signature (or its placeholders).
const SIGNATURE_FIELD_COUNT: usize = 3;

/// An ECDSA signature in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    /// `r || s`
    pub fn compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }
}

/// A signed encoding split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub fields: Vec<RawValue>,
    pub signature: Signature,
}

/// Stateless signing engine bound to one chain and one `v` encoding.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    config: SignerConfig,
}

impl Signer {
    pub fn new(config: SignerConfig) -> Self {
        Signer { config }
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Folds a 0/1 recovery id into the configured wire `v`.
    pub fn encode_v(&self, recovery_id: u8) -> Result<u64> {
        if recovery_id > 1 {
            return Err(SignerError::InvalidRecoveryId(recovery_id as u64));
        }
        self.v_offset().map(|b| b + recovery_id as u64).ok_or_else(|| {
            SignerError::InvalidField(format!("chain id {} overflows v", self.config.chain_id))
        })
    }

    /// Inverse of [`Signer::encode_v`]; anything that does not land on 0 or 1
    /// is rejected.
    pub fn decode_v(&self, v: u64) -> Result<u8> {
        match self.v_offset().and_then(|b| v.checked_sub(b)) {
            Some(id @ 0..=1) => Ok(id as u8),
            _ => Err(SignerError::InvalidRecoveryId(v)),
        }
    }

    fn v_offset(&self) -> Option<u64> {
        match self.config.v_encoding {
            VEncoding::Legacy => Some(LEGACY_V_OFFSET),
            VEncoding::Eip155 => self
                .config
                .chain_id
                .checked_mul(2)
                .and_then(|c| c.checked_add(EIP155_V_OFFSET)),
        }
    }

    /// RLP of `fields ++ [chain_id, "", ""]`.
    pub fn signing_preimage(&self, fields: &[RawValue]) -> Vec<u8> {
        let mut preimage = Vec::with_capacity(fields.len() + SIGNATURE_FIELD_COUNT);
        preimage.extend_from_slice(fields);
        preimage.push(RawValue::Bytes(quantity_bytes(self.config.chain_id)));
        preimage.push(RawValue::empty());
        preimage.push(RawValue::empty());
        rlp::encode(&RawValue::List(preimage))
    }

    /// The digest that gets signed for `tx`.
    pub fn signing_hash(&self, tx: &Transaction) -> Result<Hash32> {
        let fields = self.checked_fields(tx)?;
        Ok(keccak256(&self.signing_preimage(&fields)))
    }

    /// Signs a 32-byte digest, returning `v` in the configured encoding.
    pub fn sign_hash(&self, digest: &Hash32, private_key: &[u8]) -> Result<Signature> {
        let secret_key = parse_secret_key(private_key)?;
        let message = Message::from_digest(*digest);
        let (recovery_id, compact) = SECP256K1_CONTEXT
            .sign_ecdsa_recoverable(&message, &secret_key)
            .serialize_compact();

        let recovery_id = u8::try_from(recovery_id.to_i32())
            .map_err(|_| SignerError::InvalidRecoveryId(recovery_id.to_i32() as u64))?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        Ok(Signature {
            v: self.encode_v(recovery_id)?,
            r,
            s,
        })
    }

    /// Signs `tx` and returns the final RLP encoding
    /// `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`.
    pub fn sign(&self, tx: &Transaction, private_key: &[u8]) -> Result<Vec<u8>> {
        let fields = self.checked_fields(tx)?;
        let digest = keccak256(&self.signing_preimage(&fields));
        let signature = self.sign_hash(&digest, private_key)?;

        let mut signed = Vec::with_capacity(fields.len() + SIGNATURE_FIELD_COUNT);
        signed.extend(fields);
        signed.push(RawValue::Bytes(quantity_bytes(signature.v)));
        signed.push(RawValue::Bytes(signature.r.to_vec()));
        signed.push(RawValue::Bytes(signature.s.to_vec()));

        tracing::debug!(
            chain_id = self.config.chain_id,
            v = signature.v,
            "signed transaction"
        );
        Ok(rlp::encode(&RawValue::List(signed)))
    }

    /// [`Signer::sign`], rendered as lowercase hex without `0x`.
    pub fn sign_to_hex(&self, tx: &Transaction, private_key: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sign(tx, private_key)?))
    }

    /// Splits a signed encoding into its unsigned fields and signature.
    ///
    /// `v` is checked against the configured encoding before `r` and `s` are
    /// looked at, so a foreign `v` always surfaces as `InvalidRecoveryId`.
    pub fn decode_signed(&self, signed: &[u8]) -> Result<DecodedTransaction> {
        let items = rlp::decode(signed)?.into_list().ok_or_else(|| {
            SignerError::MalformedEncoding("signed transaction must be a list".to_string())
        })?;
        let (fields, trailer) = rlp::split_tail(&items, SIGNATURE_FIELD_COUNT)?;
        if fields.len() != UNSIGNED_FIELD_COUNT {
            return Err(SignerError::MalformedEncoding(format!(
                "expected {} fields before the signature, found {}",
                UNSIGNED_FIELD_COUNT,
                fields.len()
            )));
        }

        let [v, r, s] = trailer else {
            return Err(SignerError::MalformedEncoding(
                "missing signature fields".to_string(),
            ));
        };
        let v = v_value(signature_component(v, "v")?)?;
        self.decode_v(v)?;
        let (r, s) = (signature_component(r, "r")?, signature_component(s, "s")?);

        Ok(DecodedTransaction {
            fields: fields.to_vec(),
            signature: Signature {
                v,
                r: scalar_32(r, "r")?,
                s: scalar_32(s, "s")?,
            },
        })
    }

    /// Recovers the uncompressed public key that produced `signed`.
    pub fn recover_public_key(&self, signed: &[u8]) -> Result<UncompressedPublicKey> {
        let decoded = self.decode_signed(signed)?;
        let recovery_id = self.decode_v(decoded.signature.v)?;
        let digest = keccak256(&self.signing_preimage(&decoded.fields));

        let recovery_id = RecoveryId::from_i32(recovery_id as i32)
            .map_err(|e| SignerError::InvalidSignature(format!("Bad recovery id: {}", e)))?;
        let recoverable =
            RecoverableSignature::from_compact(&decoded.signature.compact(), recovery_id)
                .map_err(|e| SignerError::InvalidSignature(format!("Bad r/s values: {}", e)))?;
        let public_key = SECP256K1_CONTEXT
            .recover_ecdsa(&Message::from_digest(digest), &recoverable)
            .map_err(|e| SignerError::InvalidSignature(format!("Recovery failed: {}", e)))?;
        Ok(public_key.serialize_uncompressed())
    }

    /// Accepts the hex form produced by [`Signer::sign_to_hex`], `0x`/`0X`
    /// optional.
    pub fn recover_public_key_hex(&self, signed_hex: &str) -> Result<UncompressedPublicKey> {
        let trimmed = signed_hex.trim();
        let digits = strip_hex_prefix(trimmed);
        let signed = hex::decode(digits).map_err(|e| {
            SignerError::InvalidSignature(format!("Invalid signed transaction hex: {}", e))
        })?;
        self.recover_public_key(&signed)
    }

    /// The sender's address, recovered from the signature.
    pub fn recover_address(&self, signed: &[u8]) -> Result<Address> {
        let public_key = self.recover_public_key(signed)?;
        let address = address_from_uncompressed(&public_key);
        tracing::debug!(address = %hex::encode(address), "recovered sender");
        Ok(address)
    }

    fn checked_fields(&self, tx: &Transaction) -> Result<Vec<RawValue>> {
        let chain_id = tx.chain_id_value()?;
        if chain_id != self.config.chain_id {
            return Err(SignerError::InvalidField(format!(
                "chainId {} does not match configured chain {}",
                chain_id, self.config.chain_id
            )));
        }
        tx.unsigned_fields()
    }
}

/// Checks `signature` over `digest` against a compressed or uncompressed
/// public key. Malformed inputs simply fail verification.
pub fn verify_signature(digest: &Hash32, signature: &Signature, public_key: &[u8]) -> bool {
    let Ok(public_key) = parse_public_key(public_key) else {
        return false;
    };
    let Ok(signature) = EcdsaSignature::from_compact(&signature.compact()) else {
        return false;
    };
    SECP256K1_CONTEXT
        .verify_ecdsa(&Message::from_digest(*digest), &signature, &public_key)
        .is_ok()
}

/// Keccak-256 of a signed encoding, i.e. the transaction hash.
pub fn transaction_hash(signed: &[u8]) -> Hash32 {
    keccak256(signed)
}

fn signature_component<'a>(value: &'a RawValue, name: &str) -> Result<&'a [u8]> {
    value
        .as_bytes()
        .ok_or_else(|| SignerError::InvalidSignature(format!("{} must be a byte string", name)))
}

/// Reads `v` as a minimal big-endian integer. Values too wide for `u64`
/// cannot match any encoding and saturate so the caller reports them as a bad
/// recovery id.
fn v_value(bytes: &[u8]) -> Result<u64> {
    if bytes.first() == Some(&0) {
        return Err(SignerError::InvalidSignature(
            "v has a leading zero byte".to_string(),
        ));
    }
    if bytes.len() > 8 {
        return Ok(u64::MAX);
    }
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

fn scalar_32(bytes: &[u8], name: &str) -> Result<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        SignerError::InvalidSignature(format!("{} must be 32 bytes, got {}", name, bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_public_key, KeyPair};

    const EIP155_KEY: [u8; 32] = [0x46; 32];

    fn eip155_example() -> Transaction {
        Transaction {
            nonce: "09".to_string(),
            gas_price: "04a817c800".to_string(),
            gas_limit: "5208".to_string(),
            to: "3535353535353535353535353535353535353535".to_string(),
            value: "0de0b6b3a7640000".to_string(),
            data: String::new(),
            chain_id: "01".to_string(),
        }
    }

    fn signer(v_encoding: VEncoding) -> Signer {
        Signer::new(SignerConfig::new(1, v_encoding).unwrap())
    }

    #[test]
    fn test_signing_preimage_matches_eip155_example() {
        let signer = signer(VEncoding::Legacy);
        let fields = eip155_example().unsigned_fields().unwrap();
        assert_eq!(
            hex::encode(signer.signing_preimage(&fields)),
            "ec098504a817c800825208943535353535353535353535353535353535353535\
             880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(signer.signing_hash(&eip155_example()).unwrap()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_encoding_known_answer() {
        let signed = signer(VEncoding::Eip155)
            .sign_to_hex(&eip155_example(), &EIP155_KEY)
            .unwrap();
        assert_eq!(
            signed,
            "f86c098504a817c800825208943535353535353535353535353535353535353535\
             880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620\
             aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_legacy_signed_encoding_known_answer() {
        let signed = signer(VEncoding::Legacy)
            .sign_to_hex(&eip155_example(), &EIP155_KEY)
            .unwrap();
        assert_eq!(
            signed,
            "f86c098504a817c800825208943535353535353535353535353535353535353535\
             880de0b6b3a7640000801ba028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620\
             aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_sign_recover_round_trip_both_encodings() {
        for encoding in [VEncoding::Legacy, VEncoding::Eip155] {
            let signer = signer(encoding);
            let keypair = KeyPair::generate().unwrap();
            let signed = signer.sign(&eip155_example(), &keypair.private_key()).unwrap();
            assert_eq!(
                signer.recover_public_key(&signed).unwrap(),
                keypair.public_key_uncompressed()
            );
            assert_eq!(signer.recover_address(&signed).unwrap(), keypair.address());
        }
    }

    #[test]
    fn test_recover_from_hex_with_prefix() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign_to_hex(&eip155_example(), &EIP155_KEY).unwrap();
        let public_key = signer
            .recover_public_key_hex(&format!("0x{}", signed))
            .unwrap();
        assert_eq!(public_key, derive_public_key(&EIP155_KEY).unwrap());
        assert_eq!(
            signer
                .recover_public_key_hex(&format!("0X{}", signed.to_uppercase()))
                .unwrap(),
            public_key
        );
        assert!(matches!(
            signer.recover_public_key_hex("0xzz"),
            Err(SignerError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_v_encoding_round_trip() {
        let legacy = signer(VEncoding::Legacy);
        assert_eq!(legacy.encode_v(0).unwrap(), 27);
        assert_eq!(legacy.encode_v(1).unwrap(), 28);
        assert_eq!(legacy.decode_v(27).unwrap(), 0);
        assert_eq!(legacy.decode_v(28).unwrap(), 1);

        let eip155 = signer(VEncoding::Eip155);
        assert_eq!(eip155.encode_v(0).unwrap(), 37);
        assert_eq!(eip155.decode_v(38).unwrap(), 1);
        assert!(eip155.encode_v(2).is_err());
    }

    #[test]
    fn test_decode_v_rejects_out_of_range() {
        let legacy = signer(VEncoding::Legacy);
        for v in [0, 1, 26, 29, 37, u64::MAX] {
            assert_eq!(legacy.decode_v(v), Err(SignerError::InvalidRecoveryId(v)));
        }
        let eip155 = signer(VEncoding::Eip155);
        assert_eq!(eip155.decode_v(27), Err(SignerError::InvalidRecoveryId(27)));
    }

    #[test]
    fn test_recover_rejects_tampered_v() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign(&eip155_example(), &EIP155_KEY).unwrap();
        let mut items = rlp::decode(&signed).unwrap().into_list().unwrap();
        items[6] = RawValue::Bytes(vec![29]);
        let tampered = rlp::encode(&RawValue::List(items));
        assert_eq!(
            signer.recover_public_key(&tampered),
            Err(SignerError::InvalidRecoveryId(29))
        );
    }

    fn with_trailer(signed: &[u8], v: Vec<u8>, r: Vec<u8>) -> Vec<u8> {
        let mut items = rlp::decode(signed).unwrap().into_list().unwrap();
        items[6] = RawValue::Bytes(v);
        items[7] = RawValue::Bytes(r);
        rlp::encode(&RawValue::List(items))
    }

    #[test]
    fn test_foreign_v_reported_before_bad_r() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign(&eip155_example(), &EIP155_KEY).unwrap();
        let tampered = with_trailer(&signed, vec![29], vec![0x01; 31]);
        assert_eq!(
            signer.recover_public_key(&tampered),
            Err(SignerError::InvalidRecoveryId(29))
        );
        assert_eq!(
            signer.decode_signed(&tampered),
            Err(SignerError::InvalidRecoveryId(29))
        );
    }

    #[test]
    fn test_oversized_v_is_invalid_recovery_id() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign(&eip155_example(), &EIP155_KEY).unwrap();
        let items = rlp::decode(&signed).unwrap().into_list().unwrap();
        let r = items[7].as_bytes().unwrap().to_vec();
        let tampered = with_trailer(&signed, vec![0x01; 9], r);
        assert_eq!(
            signer.recover_public_key(&tampered),
            Err(SignerError::InvalidRecoveryId(u64::MAX))
        );
    }

    #[test]
    fn test_v_with_leading_zero_rejected() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign(&eip155_example(), &EIP155_KEY).unwrap();
        let items = rlp::decode(&signed).unwrap().into_list().unwrap();
        let v = items[6].as_bytes().unwrap()[0];
        let r = items[7].as_bytes().unwrap().to_vec();

        let padded = with_trailer(&signed, vec![0x00, v], r);
        match signer.recover_public_key(&padded) {
            Err(SignerError::InvalidSignature(msg)) => assert!(msg.contains("leading zero")),
            other => panic!("Expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn test_recover_rejects_short_r() {
        let signer = signer(VEncoding::Legacy);
        let signed = signer.sign(&eip155_example(), &EIP155_KEY).unwrap();
        let mut items = rlp::decode(&signed).unwrap().into_list().unwrap();
        items[7] = RawValue::Bytes(vec![0x01; 31]);
        let tampered = rlp::encode(&RawValue::List(items));
        match signer.recover_public_key(&tampered) {
            Err(SignerError::InvalidSignature(msg)) => assert!(msg.contains("r must be 32 bytes")),
            other => panic!("Expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn test_recover_rejects_wrong_shape() {
        let signer = signer(VEncoding::Legacy);
        let not_a_list = rlp::encode(&RawValue::Bytes(b"hello".to_vec()));
        assert!(matches!(
            signer.recover_public_key(&not_a_list),
            Err(SignerError::MalformedEncoding(_))
        ));

        let too_short = rlp::encode(&RawValue::List(vec![RawValue::empty(); 4]));
        assert!(matches!(
            signer.recover_public_key(&too_short),
            Err(SignerError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_recovery_on_other_chain_yields_other_key() {
        let signed = signer(VEncoding::Legacy)
            .sign(&eip155_example(), &EIP155_KEY)
            .unwrap();
        let other_chain = Signer::new(SignerConfig::new(3, VEncoding::Legacy).unwrap());
        let recovered = other_chain.recover_public_key(&signed);
        assert_ne!(recovered.ok(), Some(derive_public_key(&EIP155_KEY).unwrap()));
    }

    #[test]
    fn test_sign_rejects_chain_mismatch() {
        let mut tx = eip155_example();
        tx.chain_id = "03".to_string();
        assert!(matches!(
            signer(VEncoding::Legacy).sign(&tx, &EIP155_KEY),
            Err(SignerError::InvalidField(_))
        ));
    }

    #[test]
    fn test_sign_rejects_invalid_private_key() {
        assert!(matches!(
            signer(VEncoding::Legacy).sign(&eip155_example(), &[0u8; 32]),
            Err(SignerError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_odd_length_field_signs_like_padded() {
        let signer = signer(VEncoding::Legacy);
        let mut odd = eip155_example();
        odd.value = "abc".to_string();
        let mut even = eip155_example();
        even.value = "0abc".to_string();
        assert_eq!(
            signer.sign(&odd, &EIP155_KEY).unwrap(),
            signer.sign(&even, &EIP155_KEY).unwrap()
        );
    }

    #[test]
    fn test_verify_signature() {
        let signer = signer(VEncoding::Legacy);
        let digest = signer.signing_hash(&eip155_example()).unwrap();
        let signature = signer.sign_hash(&digest, &EIP155_KEY).unwrap();
        let public_key = derive_public_key(&EIP155_KEY).unwrap();
        assert!(verify_signature(&digest, &signature, &public_key));

        let other = KeyPair::generate().unwrap();
        assert!(!verify_signature(
            &digest,
            &signature,
            &other.public_key_uncompressed()
        ));
        assert!(!verify_signature(&keccak256(b"other"), &signature, &public_key));
        assert!(!verify_signature(&digest, &signature, &public_key[1..]));
    }

    #[test]
    fn test_transaction_hash_of_eip155_example() {
        let signed = signer(VEncoding::Eip155)
            .sign(&eip155_example(), &EIP155_KEY)
            .unwrap();
        assert_eq!(transaction_hash(&signed), keccak256(&signed));
        assert_eq!(
            hex::encode(transaction_hash(&signed)),
            "33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788"
        );
    }
}
