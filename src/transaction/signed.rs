use ethers::types::{Address, U256};

use crate::encoding::{self, Field, Item};
use crate::error::{AppError, AppResult};
use crate::privacy::PublicKey;
use crate::signer::{recover_address, DigestSigner, SIGNATURE_LENGTH};
use crate::utils::encode_hex_data;

use super::{PrivateTransaction, Restriction, CHAIN_ID_V_OFFSET, LEGACY_V_OFFSET};

/// Number of top-level elements in the wire encoding
pub const TX_FIELD_COUNT: usize = 12;

/// Normalized signature values as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    pub(crate) v: U256,
    pub(crate) r: U256,
    pub(crate) s: U256,
}

/// Signed private transaction; immutable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPrivateTransaction {
    tx: PrivateTransaction,
    signature: TxSignature,
}

impl SignedPrivateTransaction {
    pub(super) fn new(tx: PrivateTransaction, signature: TxSignature) -> Self {
        Self { tx, signature }
    }

    /// The unsigned fields this signature covers
    pub fn transaction(&self) -> &PrivateTransaction {
        &self.tx
    }

    pub fn signature(&self) -> &TxSignature {
        &self.signature
    }

    /// Sign the same fields again; the current signature is discarded
    pub fn resign(&self, chain_id: u64, signer: &dyn DigestSigner) -> AppResult<Self> {
        self.tx.sign(chain_id, signer)
    }

    fn wire_fields(&self) -> Vec<Field> {
        let tx = &self.tx;
        let mut fields = vec![
            Field::Uint(tx.nonce),
            Field::BigUint(tx.gas_price),
            Field::Uint(tx.gas_limit),
            Field::address(tx.to),
            Field::BigUint(tx.value),
            Field::Bytes(tx.data.clone()),
            Field::BigUint(self.signature.v),
            Field::BigUint(self.signature.r),
            Field::BigUint(self.signature.s),
        ];
        fields.extend(tx.private_fields());
        fields
    }

    /// Canonical wire encoding:
    /// `[nonce, gasPrice, gasLimit, to, value, data, v, r, s, privateFrom, privateFor, restriction]`
    pub fn encode(&self) -> AppResult<Vec<u8>> {
        encoding::encode(&self.wire_fields())
    }

    /// `0x`-prefixed hex of [`Self::encode`], the `eea_sendRawTransaction` parameter
    pub fn raw_hex(&self) -> AppResult<String> {
        Ok(encode_hex_data(&self.encode()?))
    }

    /// Parse the wire encoding produced by [`Self::encode`]
    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        let root = encoding::decode(bytes)?;
        let items = root.as_list()?;
        if items.len() != TX_FIELD_COUNT {
            return Err(AppError::Format(format!(
                "private transaction must have {} fields, got {}",
                TX_FIELD_COUNT,
                items.len()
            )));
        }

        let to = items[3].as_fixed(20)?.map(|bytes| Address::from_slice(&bytes));
        let private_for = items[10]
            .as_list()?
            .iter()
            .map(|item| item.as_bytes().map(|b| PublicKey::new(b.to_vec())))
            .collect::<AppResult<Vec<_>>>()?;
        let restriction = items[11].as_text()?.parse::<Restriction>()?;

        let tx = PrivateTransaction {
            nonce: items[0].as_u64()?,
            gas_price: items[1].as_u256()?,
            gas_limit: items[2].as_u64()?,
            to,
            value: items[4].as_u256()?,
            data: items[5].as_bytes()?.to_vec(),
            private_from: PublicKey::new(items[9].as_bytes()?.to_vec()),
            private_for,
            restriction,
        };
        let signature = TxSignature {
            v: items[6].as_u256()?,
            r: items[7].as_u256()?,
            s: items[8].as_u256()?,
        };

        Ok(Self { tx, signature })
    }

    /// Raw recovery id (0 or 1) implied by `v` for `chain_id`
    pub fn recovery_id(&self, chain_id: u64) -> AppResult<u8> {
        let offset = U256::from(chain_id) * U256::from(2u64)
            + U256::from(CHAIN_ID_V_OFFSET)
            + U256::from(LEGACY_V_OFFSET);
        let recovery = self
            .signature
            .v
            .checked_sub(offset)
            .filter(|r| *r <= U256::one())
            .ok_or_else(|| {
                AppError::Format(format!(
                    "v {} does not match chain id {}",
                    self.signature.v, chain_id
                ))
            })?;
        Ok(recovery.as_u32() as u8)
    }

    /// Recover the signing account, as the node does for `chain_id`
    pub fn sender(&self, chain_id: u64) -> AppResult<Address> {
        let digest = self.tx.signing_digest(chain_id)?;

        let mut raw = [0u8; SIGNATURE_LENGTH];
        self.signature.r.to_big_endian(&mut raw[..32]);
        self.signature.s.to_big_endian(&mut raw[32..64]);
        raw[64] = self.recovery_id(chain_id)?;

        recover_address(&digest, &raw)
    }
}

/// Top-level element count of an encoded transaction, without full decoding
pub fn field_count(bytes: &[u8]) -> AppResult<usize> {
    match encoding::decode(bytes)? {
        Item::List(items) => Ok(items.len()),
        Item::Bytes(_) => Err(AppError::Format("private transaction is not a list".to_string())),
    }
}
