//! Hex helpers for node quantities and data fields

use ethers::types::U256;

use crate::error::{AppError, AppResult};

/// Split a quantity into its hex digits, enforcing the node's quantity rules:
/// `0x` prefix, at least one digit, no leading zeros.
fn quantity_digits(input: &str) -> Result<&str, String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| "hex string without 0x prefix".to_string())?;
    if digits.is_empty() {
        return Err("hex string \"0x\"".to_string());
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err("hex number with leading zero digits".to_string());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex quantity {}", input));
    }
    Ok(digits)
}

/// Decode a hex quantity such as `"0x1a"` into a `u64`
pub fn decode_hex_u64(input: &str) -> AppResult<u64> {
    let digits = quantity_digits(input).map_err(AppError::Decode)?;
    if digits.len() > 16 {
        return Err(AppError::Decode("hex number > 64 bits".to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|e| AppError::Decode(e.to_string()))
}

/// Decode a hex quantity into a 256-bit integer
pub fn decode_hex_u256(input: &str) -> AppResult<U256> {
    let digits = quantity_digits(input).map_err(AppError::Decode)?;
    if digits.len() > 64 {
        return Err(AppError::Decode("hex number > 256 bits".to_string()));
    }
    U256::from_str_radix(digits, 16).map_err(|e| AppError::Decode(e.to_string()))
}

/// Decode `0x`-prefixed hex data; `"0x"` is the empty byte string
pub fn decode_hex_data(input: &str) -> AppResult<Vec<u8>> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| AppError::Decode("hex string without 0x prefix".to_string()))?;
    hex::decode(digits).map_err(|e| AppError::Decode(e.to_string()))
}

/// `0x`-prefixed lowercase hex
pub fn encode_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
