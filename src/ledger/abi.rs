//! Minimal Solidity ABI encoding/decoding
//!
//! Covers exactly what the paper-registry contract needs: Keccak-256
//! function selectors, `string` / `address` / `uint256` arguments, and
//! decoding of `address`, `bool`, `uint256` and `address[]` return values.

use sha3::{Digest, Keccak256};

use crate::types::{GatewayError, Result};

const WORD: usize = 32;

/// An encodable call argument
#[derive(Debug, Clone)]
pub enum Token {
    /// Dynamic UTF-8 string
    String(String),
    /// 20-byte account address
    Address([u8; 20]),
    /// Unsigned integer, widened to uint256
    Uint(u64),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::String(_))
    }
}

/// First four bytes of keccak256 over the canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Encode a full calldata payload: selector + head/tail argument layout
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let head_len = args.len() * WORD;
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        if arg.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
            match arg {
                Token::String(s) => tail.extend_from_slice(&encode_bytes(s.as_bytes())),
                _ => unreachable!(),
            }
        } else {
            match arg {
                Token::Address(addr) => {
                    let mut word = [0u8; WORD];
                    word[12..].copy_from_slice(addr);
                    head.extend_from_slice(&word);
                }
                Token::Uint(n) => head.extend_from_slice(&uint_word(*n)),
                Token::String(_) => unreachable!(),
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head.len() + tail.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    out
}

/// Length-prefixed bytes, zero-padded to a word boundary
fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded_len);
    out.extend_from_slice(&uint_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded_len, 0);
    out
}

/// A u64 widened into a big-endian 32-byte word
fn uint_word(n: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&n.to_be_bytes());
    word
}

/// Parse a `0x`-prefixed hex return payload into raw bytes
pub fn decode_hex(data: &str) -> Result<Vec<u8>> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped)
        .map_err(|e| GatewayError::LookupFailed(format!("invalid hex return data: {}", e)))
}

/// Decode a single address return value
pub fn decode_address(data: &[u8]) -> Result<String> {
    let word = word_at(data, 0)?;
    Ok(format!("0x{}", hex::encode(&word[12..])))
}

/// Decode a single bool return value
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    let word = word_at(data, 0)?;
    Ok(word[WORD - 1] != 0)
}

/// Decode a single uint256 return value that fits in u64
pub fn decode_uint(data: &[u8]) -> Result<u64> {
    let word = word_at(data, 0)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(GatewayError::LookupFailed(
            "uint256 return value exceeds u64".to_string(),
        ));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(buf))
}

/// Decode an `address[]` return value
pub fn decode_address_array(data: &[u8]) -> Result<Vec<String>> {
    let truncated = || GatewayError::LookupFailed("address[] return data truncated".to_string());

    let offset = decode_uint(data)? as usize;
    let tail = data.get(offset..).ok_or_else(truncated)?;
    let len = decode_uint(tail)? as usize;
    let items = tail.get(WORD..).ok_or_else(truncated)?;

    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let item = items.get(i * WORD..).ok_or_else(truncated)?;
        out.push(decode_address(item)?);
    }
    Ok(out)
}

fn word_at(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or_else(|| GatewayError::LookupFailed("return data shorter than one word".to_string()))
}
