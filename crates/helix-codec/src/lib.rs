//! Address codec: one 20-byte account key hash, two encodings.
//!
//! The chain derives a single account from a secp256k1 key and exposes it
//! both as an EIP-55 checksummed 0x-hex address (EVM side) and as a strict
//! Bech32 string under the chain prefix (Cosmos side). Both directions are
//! pure and deterministic; `bech32_to_hex(hex_to_bech32(h, p))` returns the
//! checksummed form of `h` for every valid input.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use sha3::{Digest, Keccak256};

use helix_types::{Result, WalletError};

/// Byte length of an account key hash.
pub const ADDRESS_LEN: usize = 20;

/// Parse a 0x-prefixed hex address into its 20 raw bytes.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase and
/// all-uppercase forms are accepted without a checksum, matching common
/// provider behavior.
pub fn parse_hex(addr: &str) -> Result<[u8; ADDRESS_LEN]> {
    let body = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidAddressFormat(format!("missing 0x prefix: {}", addr)))?;

    if body.len() != ADDRESS_LEN * 2 {
        return Err(WalletError::InvalidAddressFormat(format!(
            "expected {} hex chars, got {}",
            ADDRESS_LEN * 2,
            body.len()
        )));
    }

    let raw = hex::decode(body)
        .map_err(|e| WalletError::InvalidAddressFormat(format!("bad hex: {}", e)))?;

    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&raw);
        let expected = checksum_hex(&bytes);
        if expected[2..] != *body {
            return Err(WalletError::InvalidAddressFormat(format!(
                "checksum mismatch: {}",
                addr
            )));
        }
    }

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&raw);
    Ok(bytes)
}

/// EIP-55 checksummed 0x-hex form of an account key hash.
pub fn checksum_hex(bytes: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let digest = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + ADDRESS_LEN * 2);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Encode 20 raw bytes as a strict Bech32 string under `prefix`.
pub fn encode_bech32(bytes: &[u8; ADDRESS_LEN], prefix: &str) -> Result<String> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| WalletError::InvalidAddressFormat(format!("bad prefix {:?}: {}", prefix, e)))?;
    bech32::encode::<Bech32>(hrp, bytes)
        .map_err(|e| WalletError::InvalidAddressFormat(e.to_string()))
}

/// Decode a strict Bech32 address into its prefix and 20 raw bytes.
pub fn decode_bech32(addr: &str) -> Result<(String, [u8; ADDRESS_LEN])> {
    let checked = CheckedHrpstring::new::<Bech32>(addr)
        .map_err(|e| WalletError::InvalidAddressFormat(format!("{}: {}", addr, e)))?;

    let prefix = checked.hrp().to_lowercase();
    let raw: Vec<u8> = checked.byte_iter().collect();
    if raw.len() != ADDRESS_LEN {
        return Err(WalletError::InvalidAddressFormat(format!(
            "expected {}-byte payload, got {}",
            ADDRESS_LEN,
            raw.len()
        )));
    }

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&raw);
    Ok((prefix, bytes))
}

/// Convert a 0x-hex address to its Bech32 form under `prefix`.
pub fn hex_to_bech32(addr: &str, prefix: &str) -> Result<String> {
    let bytes = parse_hex(addr)?;
    encode_bech32(&bytes, prefix)
}

/// Convert a Bech32 address to its EIP-55 checksummed 0x-hex form.
pub fn bech32_to_hex(addr: &str) -> Result<String> {
    let (_, bytes) = decode_bech32(addr)?;
    Ok(checksum_hex(&bytes))
}
