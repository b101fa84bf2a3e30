//! Recursive-length prefix (RLP) serialization.
//!
//! Every signature hash depends on the exact bytes produced here, so the
//! encoder only ever emits the canonical form and the decoder rejects
//! anything else.

use crate::error::{Result, SignerError};

/// Largest payload that still fits in a single-byte length prefix.
const SHORT_PAYLOAD_MAX: usize = 55;

const STRING_OFFSET: u8 = 0x80;
const LONG_STRING_OFFSET: u8 = 0xb7;
const LIST_OFFSET: u8 = 0xc0;
const LONG_LIST_OFFSET: u8 = 0xf7;

/// Deepest list nesting the decoder will follow. A signed transaction is a
/// single flat list.
pub const MAX_DEPTH: usize = 64;

/// A node of an RLP tree: either a byte string or an ordered list of nodes.
///
/// There is no null; an absent field is the zero-length byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Bytes(Vec<u8>),
    List(Vec<RawValue>),
}

impl RawValue {
    /// The zero-length byte string, encoded as a lone `0x80`.
    pub fn empty() -> Self {
        RawValue::Bytes(Vec::new())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Bytes(bytes) => Some(bytes),
            RawValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::List(items) => Some(items),
            RawValue::Bytes(_) => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<RawValue>> {
        match self {
            RawValue::List(items) => Some(items),
            RawValue::Bytes(_) => None,
        }
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(bytes: Vec<u8>) -> Self {
        RawValue::Bytes(bytes)
    }
}

impl From<&[u8]> for RawValue {
    fn from(bytes: &[u8]) -> Self {
        RawValue::Bytes(bytes.to_vec())
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        RawValue::List(items)
    }
}

/// Encodes a value into its canonical RLP byte form.
pub fn encode(value: &RawValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &RawValue, out: &mut Vec<u8>) {
    match value {
        RawValue::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < STRING_OFFSET {
                out.push(bytes[0]);
            } else {
                encode_header(bytes.len(), STRING_OFFSET, LONG_STRING_OFFSET, out);
                out.extend_from_slice(bytes);
            }
        }
        RawValue::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_into(item, &mut payload);
            }
            encode_header(payload.len(), LIST_OFFSET, LONG_LIST_OFFSET, out);
            out.extend_from_slice(&payload);
        }
    }
}

fn encode_header(len: usize, short_offset: u8, long_offset: u8, out: &mut Vec<u8>) {
    if len <= SHORT_PAYLOAD_MAX {
        out.push(short_offset + len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let leading_zeros = len_bytes.iter().take_while(|&&b| b == 0).count();
        let significant = &len_bytes[leading_zeros..];
        out.push(long_offset + significant.len() as u8);
        out.extend_from_slice(significant);
    }
}

/// Decodes exactly one value; trailing bytes after it are an error.
pub fn decode(bytes: &[u8]) -> Result<RawValue> {
    let (value, rest) = decode_item(bytes, 0)?;
    if !rest.is_empty() {
        return Err(SignerError::MalformedEncoding(format!(
            "{} trailing bytes after complete value",
            rest.len()
        )));
    }
    Ok(value)
}

/// Decodes one value and hands back whatever follows it untouched.
pub fn decode_lenient(bytes: &[u8]) -> Result<(RawValue, &[u8])> {
    decode_item(bytes, 0)
}

/// `depth` is the number of lists enclosing `input`.
fn decode_item(input: &[u8], depth: usize) -> Result<(RawValue, &[u8])> {
    let (&prefix, after_prefix) = input
        .split_first()
        .ok_or_else(|| SignerError::MalformedEncoding("unexpected end of input".to_string()))?;

    match prefix {
        0x00..=0x7f => Ok((RawValue::Bytes(vec![prefix]), after_prefix)),
        0x80..=0xb7 => {
            let len = (prefix - STRING_OFFSET) as usize;
            let (payload, rest) = take(after_prefix, len)?;
            if len == 1 && payload[0] < STRING_OFFSET {
                return Err(SignerError::MalformedEncoding(format!(
                    "single byte 0x{:02x} must encode as itself",
                    payload[0]
                )));
            }
            Ok((RawValue::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let (len, after_len) = read_long_length(after_prefix, prefix - LONG_STRING_OFFSET)?;
            let (payload, rest) = take(after_len, len)?;
            Ok((RawValue::Bytes(payload.to_vec()), rest))
        }
        0xc0..=0xf7 => {
            check_depth(depth)?;
            let len = (prefix - LIST_OFFSET) as usize;
            let (payload, rest) = take(after_prefix, len)?;
            Ok((RawValue::List(decode_list_payload(payload, depth + 1)?), rest))
        }
        0xf8..=0xff => {
            check_depth(depth)?;
            let (len, after_len) = read_long_length(after_prefix, prefix - LONG_LIST_OFFSET)?;
            let (payload, rest) = take(after_len, len)?;
            Ok((RawValue::List(decode_list_payload(payload, depth + 1)?), rest))
        }
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(SignerError::MalformedEncoding(format!(
            "nesting too deep: more than {} lists",
            MAX_DEPTH
        )));
    }
    Ok(())
}

fn decode_list_payload(mut payload: &[u8], depth: usize) -> Result<Vec<RawValue>> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_item(payload, depth)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn take(input: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if input.len() < len {
        return Err(SignerError::MalformedEncoding(format!(
            "length prefix claims {} bytes but only {} remain",
            len,
            input.len()
        )));
    }
    Ok(input.split_at(len))
}

fn read_long_length(input: &[u8], len_of_len: u8) -> Result<(usize, &[u8])> {
    let len_of_len = len_of_len as usize;
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(SignerError::MalformedEncoding(format!(
            "length of length {} exceeds platform word size",
            len_of_len
        )));
    }
    let (len_bytes, rest) = take(input, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(SignerError::MalformedEncoding(
            "length has leading zero byte".to_string(),
        ));
    }
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len <= SHORT_PAYLOAD_MAX {
        return Err(SignerError::MalformedEncoding(format!(
            "long-form length {} should use the short form",
            len
        )));
    }
    Ok((len, rest))
}

/// Splits a decoded list into its leading items and its last `n` items.
pub fn split_tail(items: &[RawValue], n: usize) -> Result<(&[RawValue], &[RawValue])> {
    if items.len() < n {
        return Err(SignerError::MalformedEncoding(format!(
            "expected at least {} list items, found {}",
            n,
            items.len()
        )));
    }
    Ok(items.split_at(items.len() - n))
}
