use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

use crate::error::{AppError, AppResult};

/// Privacy-manager public key, raw bytes
///
/// Equality is byte-wise. [`PublicKey::ordering_hash`] is only used to order
/// participants when deriving a root group id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Length of the keys issued by the privacy manager
    pub const LENGTH: usize = 32;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode from standard padded base64, as used at the RPC boundary
    pub fn from_base64(encoded: &str) -> AppResult<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid base64 public key: {}", e)))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 32-bit signed fold over the key bytes: `acc = 31 * acc + byte`, starting
    /// at 1, with each byte sign-extended and the sum wrapping at 32 bits.
    pub fn ordering_hash(&self) -> i32 {
        self.0
            .iter()
            .fold(1i32, |acc, b| acc.wrapping_mul(31).wrapping_add(i32::from(*b as i8)))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PublicKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_conversion() {
        let encoded = "A1aVtMxLCUHmBVHXoZzzBgPbW/wj5axDpW9X8l91SGo=";
        let key = PublicKey::from_base64(encoded).unwrap();
        assert_eq!(key.len(), PublicKey::LENGTH);
        assert_eq!(key.to_base64(), encoded);
        assert!(PublicKey::from_base64("%%%").is_err());
    }

    #[test]
    fn test_ordering_hash_small_inputs() {
        assert_eq!(PublicKey::new(vec![]).ordering_hash(), 1);
        assert_eq!(PublicKey::new(vec![1, 2, 3]).ordering_hash(), 30817);
        // 0x80 sign-extends to -128: 31 - 128
        assert_eq!(PublicKey::new(vec![0x80]).ordering_hash(), -97);
    }

    #[test]
    fn test_ordering_hash_wraps_at_32_bits() {
        let cases = [
            ("Ko2bVqD+nNlNYL5EE7y3IdOnviftjiizpjRt+HTuFBs=", 2130677321),
            ("k2zXEin4Ip/qBGlRkJejnGWdP9cjkK+DAvKNW31L2C8=", 568079351),
            ("A1aVtMxLCUHmBVHXoZzzBgPbW/wj5axDpW9X8l91SGo=", -487930036),
        ];
        for (encoded, expected) in cases {
            assert_eq!(PublicKey::from_base64(encoded).unwrap().ordering_hash(), expected);
        }
    }
}
