//! Canonical recursive-length-prefix encoding
//!
//! Transactions and privacy groups are hashed and transmitted as RLP lists of
//! heterogeneous fields. [`Field`] describes one element of such a list and
//! [`Item`] is the untyped tree produced when decoding.
//!
//! An absent optional field still occupies its slot and encodes as the empty
//! string (`0x80`), matching what the node expects for a missing recipient.

use ethers::types::{H256, U256};
use ethers::utils::keccak256;
use ethers::utils::rlp::{Rlp, RlpStream};

use crate::error::{AppError, AppResult};

/// A typed element of a canonical list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Unsigned integer, minimal big-endian
    Uint(u64),
    /// Arbitrary-precision non-negative integer, minimal big-endian
    BigUint(U256),
    /// Optional byte array of a fixed length; `None` encodes as the empty string
    Fixed { len: usize, value: Option<Vec<u8>> },
    /// Variable-length byte string
    Bytes(Vec<u8>),
    /// UTF-8 text, encoded as its bytes
    Text(String),
    /// Nested list
    List(Vec<Field>),
}

impl Field {
    /// Optional 20-byte account address
    pub fn address(address: Option<ethers::types::Address>) -> Self {
        Field::Fixed {
            len: 20,
            value: address.map(|a| a.as_bytes().to_vec()),
        }
    }

    /// List of byte strings
    pub fn byte_list<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Field::List(
            items
                .into_iter()
                .map(|b| Field::Bytes(b.as_ref().to_vec()))
                .collect(),
        )
    }
}

fn append_field(stream: &mut RlpStream, field: &Field) -> AppResult<()> {
    match field {
        Field::Uint(v) => {
            stream.append(v);
        }
        Field::BigUint(v) => {
            stream.append(v);
        }
        Field::Fixed { value: None, .. } => {
            stream.append_empty_data();
        }
        Field::Fixed {
            len,
            value: Some(bytes),
        } => {
            if bytes.len() != *len {
                return Err(AppError::Encoding(format!(
                    "fixed-length field expects {} bytes, got {}",
                    len,
                    bytes.len()
                )));
            }
            stream.append(bytes);
        }
        Field::Bytes(bytes) => {
            stream.append(bytes);
        }
        Field::Text(text) => {
            stream.append(text);
        }
        Field::List(items) => {
            stream.begin_list(items.len());
            for item in items {
                append_field(stream, item)?;
            }
        }
    }
    Ok(())
}

/// Encode `fields` as a single canonical list
pub fn encode(fields: &[Field]) -> AppResult<Vec<u8>> {
    let mut stream = RlpStream::new();
    stream.begin_list(fields.len());
    for field in fields {
        append_field(&mut stream, field)?;
    }
    Ok(stream.out().to_vec())
}

/// Legacy Keccak-256 (pre-SHA-3 padding) over the canonical encoding of `fields`
pub fn keccak_digest(fields: &[Field]) -> AppResult<H256> {
    let encoded = encode(fields)?;
    Ok(H256::from(keccak256(encoded)))
}

/// Untyped decoded element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Bytes(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    pub fn as_bytes(&self) -> AppResult<&[u8]> {
        match self {
            Item::Bytes(bytes) => Ok(bytes),
            Item::List(_) => Err(AppError::Encoding("expected byte string, found list".to_string())),
        }
    }

    pub fn as_list(&self) -> AppResult<&[Item]> {
        match self {
            Item::List(items) => Ok(items),
            Item::Bytes(_) => Err(AppError::Encoding("expected list, found byte string".to_string())),
        }
    }

    pub fn as_u64(&self) -> AppResult<u64> {
        let bytes = self.as_canonical_integer(8)?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub fn as_u256(&self) -> AppResult<U256> {
        let bytes = self.as_canonical_integer(32)?;
        Ok(U256::from_big_endian(bytes))
    }

    /// `None` for the empty marker, otherwise exactly `len` bytes
    pub fn as_fixed(&self, len: usize) -> AppResult<Option<Vec<u8>>> {
        let bytes = self.as_bytes()?;
        match bytes.len() {
            0 => Ok(None),
            n if n == len => Ok(Some(bytes.to_vec())),
            n => Err(AppError::Encoding(format!(
                "fixed-length field expects {} bytes, got {}",
                len, n
            ))),
        }
    }

    pub fn as_text(&self) -> AppResult<String> {
        String::from_utf8(self.as_bytes()?.to_vec())
            .map_err(|e| AppError::Encoding(format!("text field is not UTF-8: {}", e)))
    }

    fn as_canonical_integer(&self, max_len: usize) -> AppResult<&[u8]> {
        let bytes = self.as_bytes()?;
        if bytes.len() > max_len {
            return Err(AppError::Encoding(format!(
                "integer of {} bytes exceeds {} bytes",
                bytes.len(),
                max_len
            )));
        }
        if bytes.first() == Some(&0) {
            return Err(AppError::Encoding("integer has leading zero bytes".to_string()));
        }
        Ok(bytes)
    }
}

/// Reject headers the encoder would never produce
fn check_canonical_header(rlp: &Rlp) -> AppResult<()> {
    let info = rlp.payload_info()?;
    if info.header_len > 1 && info.value_len < 56 {
        return Err(AppError::Encoding(format!(
            "long-form length prefix for {} byte payload",
            info.value_len
        )));
    }
    if !rlp.is_list() && info.header_len == 1 && info.value_len == 1 {
        if let Some(byte) = rlp.as_raw().get(1).filter(|b| **b < 0x80) {
            return Err(AppError::Encoding(format!(
                "single byte {:#04x} must not carry a length prefix",
                byte
            )));
        }
    }
    Ok(())
}

fn decode_item(rlp: &Rlp) -> AppResult<Item> {
    check_canonical_header(rlp)?;
    if rlp.is_list() {
        let count = rlp.item_count()?;
        let mut items = Vec::with_capacity(count);
        for i in 0..count {
            items.push(decode_item(&rlp.at(i)?)?);
        }
        Ok(Item::List(items))
    } else {
        Ok(Item::Bytes(rlp.data()?.to_vec()))
    }
}

/// Decode one canonical item spanning all of `bytes`
pub fn decode(bytes: &[u8]) -> AppResult<Item> {
    let rlp = Rlp::new(bytes);
    let total = rlp.payload_info()?.total();
    if total != bytes.len() {
        return Err(AppError::Encoding(format!(
            "{} trailing bytes after canonical item",
            bytes.len().saturating_sub(total)
        )));
    }
    decode_item(&rlp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    #[test]
    fn test_integer_encoding() {
        assert_eq!(encode(&[Field::Uint(0)]).unwrap(), vec![0xc1, 0x80]);
        assert_eq!(encode(&[Field::Uint(0x7f)]).unwrap(), vec![0xc1, 0x7f]);
        assert_eq!(encode(&[Field::Uint(0x80)]).unwrap(), vec![0xc2, 0x81, 0x80]);
        assert_eq!(
            encode(&[Field::BigUint(U256::from(1000))]).unwrap(),
            vec![0xc3, 0x82, 0x03, 0xe8]
        );
        assert_eq!(encode(&[Field::BigUint(U256::zero())]).unwrap(), vec![0xc1, 0x80]);
    }

    #[test]
    fn test_absent_optional_keeps_its_slot() {
        let encoded = encode(&[Field::Uint(1), Field::address(None), Field::Uint(2)]).unwrap();
        assert_eq!(encoded, vec![0xc3, 0x01, 0x80, 0x02]);

        let items = decode(&encoded).unwrap();
        let items = items.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_fixed(20).unwrap(), None);
    }

    #[test]
    fn test_empty_list_digest() {
        // keccak256(0xc0), the well-known empty-ommers hash
        assert_eq!(
            hex::encode(keccak_digest(&[]).unwrap()),
            "1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
        );
    }

    #[test]
    fn test_wrong_fixed_length_is_rejected() {
        let field = Field::Fixed {
            len: 20,
            value: Some(vec![1, 2, 3]),
        };
        assert!(matches!(encode(&[field]), Err(AppError::Encoding(_))));
    }

    #[test]
    fn test_decode_reverses_encode() {
        let to: Address = "0x627306090abab3a6e1400e9345bc60c78a8bef57".parse().unwrap();
        let fields = vec![
            Field::Uint(7),
            Field::BigUint(U256::from_dec_str("340282366920938463463374607431768211456").unwrap()),
            Field::address(Some(to)),
            Field::address(None),
            Field::Bytes(vec![]),
            Field::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            Field::byte_list(Vec::<Vec<u8>>::new()),
            Field::byte_list(vec![vec![1u8; 32], vec![2u8; 32]]),
            Field::Text("restricted".to_string()),
        ];

        let decoded = decode(&encode(&fields).unwrap()).unwrap();
        let items = decoded.as_list().unwrap();

        assert_eq!(items.len(), fields.len());
        assert_eq!(items[0].as_u64().unwrap(), 7);
        assert_eq!(
            items[1].as_u256().unwrap(),
            U256::from_dec_str("340282366920938463463374607431768211456").unwrap()
        );
        assert_eq!(items[2].as_fixed(20).unwrap(), Some(to.as_bytes().to_vec()));
        assert_eq!(items[3].as_fixed(20).unwrap(), None);
        assert_eq!(items[4].as_bytes().unwrap(), &[] as &[u8]);
        assert_eq!(items[5].as_bytes().unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
        assert!(items[6].as_list().unwrap().is_empty());
        let keys = items[7].as_list().unwrap();
        assert_eq!(keys[0].as_bytes().unwrap(), &[1u8; 32]);
        assert_eq!(keys[1].as_bytes().unwrap(), &[2u8; 32]);
        assert_eq!(items[8].as_text().unwrap(), "restricted");
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        // trailing byte
        assert!(decode(&[0xc1, 0x01, 0x01]).is_err());
        // truncated list
        assert!(decode(&[0xc3, 0x01]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_non_canonical_headers() {
        // 0x05 under an 0x81 prefix
        assert!(matches!(decode(&[0xc2, 0x81, 0x05]), Err(AppError::Encoding(_))));
        assert!(matches!(decode(&[0x81, 0x05]), Err(AppError::Encoding(_))));
        // long-form lengths for short payloads
        assert!(matches!(decode(&[0xb8, 0x01, 0x80]), Err(AppError::Encoding(_))));
        assert!(matches!(decode(&[0xf8, 0x01, 0x05]), Err(AppError::Encoding(_))));

        // a single byte from 0x80 up does need the prefix
        assert_eq!(decode(&[0x81, 0x80]).unwrap(), Item::Bytes(vec![0x80]));
        assert_eq!(decode(&[0xc2, 0x81, 0xff]).unwrap(), Item::List(vec![Item::Bytes(vec![0xff])]));
    }

    #[test]
    fn test_non_canonical_integers_are_rejected() {
        assert!(Item::Bytes(vec![0x00, 0x01]).as_u64().is_err());
        assert!(Item::Bytes(vec![1; 9]).as_u64().is_err());
        assert!(Item::List(vec![]).as_u64().is_err());
        assert_eq!(Item::Bytes(vec![]).as_u64().unwrap(), 0);
    }
}
