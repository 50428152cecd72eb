//! Restricted private transactions
//!
//! A [`PrivateTransaction`] is the unsigned form, freely editable while it is
//! being built. Signing never mutates it: [`PrivateTransaction::sign`] returns
//! a separate [`SignedPrivateTransaction`], which is the only form that can be
//! encoded for `eea_sendRawTransaction`.
//!
//! Signing digest field order:
//!
//! ```text
//! [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0, privateFrom, privateFor, restriction]
//! ```
//!
//! The wire form replaces `chainId, 0, 0` with `v, r, s`.

mod signed;

use ethers::types::{Address, H256, U256};
use std::fmt;
use std::str::FromStr;

use crate::encoding::{self, Field};
use crate::error::{AppError, AppResult};
use crate::privacy::PublicKey;
use crate::signer::{DigestSigner, SIGNATURE_LENGTH};

pub use signed::{field_count, SignedPrivateTransaction, TxSignature, TX_FIELD_COUNT};

/// Offset added to the raw recovery id (legacy convention)
pub const LEGACY_V_OFFSET: u64 = 27;

/// Constant folded into `v` together with `2 * chainId`
pub const CHAIN_ID_V_OFFSET: u64 = 8;

/// Privacy restriction policy
///
/// Only restricted transactions are built here: the payload is distributed
/// to the listed participants and nobody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Restriction {
    #[default]
    Restricted,
}

impl Restriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Restriction::Restricted => "restricted",
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Restriction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restricted" => Ok(Restriction::Restricted),
            other => Err(AppError::Format(format!("unsupported restriction: {}", other))),
        }
    }
}

/// Unsigned private transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateTransaction {
    /// Sequence number scoped to (account, privacy group)
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub private_from: PublicKey,
    pub private_for: Vec<PublicKey>,
    pub restriction: Restriction,
}

impl PrivateTransaction {
    /// Build an unsigned transaction; missing `value` and `gas_price` are zero
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nonce: u64,
        to: Option<Address>,
        value: Option<U256>,
        gas_limit: u64,
        gas_price: Option<U256>,
        data: &[u8],
        private_from: PublicKey,
        private_for: Vec<PublicKey>,
    ) -> Self {
        Self {
            nonce,
            gas_price: gas_price.unwrap_or_default(),
            gas_limit,
            to,
            value: value.unwrap_or_default(),
            data: data.to_vec(),
            private_from,
            private_for,
            restriction: Restriction::Restricted,
        }
    }

    /// Contract deployment with `data` as init code
    pub fn contract_creation(
        nonce: u64,
        value: Option<U256>,
        gas_limit: u64,
        gas_price: Option<U256>,
        data: &[u8],
        private_from: PublicKey,
        private_for: Vec<PublicKey>,
    ) -> Self {
        Self::new(nonce, None, value, gas_limit, gas_price, data, private_from, private_for)
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    fn private_fields(&self) -> [Field; 3] {
        [
            Field::Bytes(self.private_from.as_bytes().to_vec()),
            Field::byte_list(&self.private_for),
            Field::Text(self.restriction.as_str().to_string()),
        ]
    }

    /// Canonical field list hashed for signing
    pub fn signing_fields(&self, chain_id: u64) -> Vec<Field> {
        let mut fields = vec![
            Field::Uint(self.nonce),
            Field::BigUint(self.gas_price),
            Field::Uint(self.gas_limit),
            Field::address(self.to),
            Field::BigUint(self.value),
            Field::Bytes(self.data.clone()),
            Field::Uint(chain_id),
            Field::Uint(0),
            Field::Uint(0),
        ];
        fields.extend(self.private_fields());
        fields
    }

    /// Keccak-256 of the canonical signing fields
    pub fn signing_digest(&self, chain_id: u64) -> AppResult<H256> {
        encoding::keccak_digest(&self.signing_fields(chain_id))
    }

    /// Sign for `chain_id`, returning a new signed transaction
    pub fn sign(&self, chain_id: u64, signer: &dyn DigestSigner) -> AppResult<SignedPrivateTransaction> {
        let digest = self.signing_digest(chain_id)?;
        let raw = signer.sign_digest(&digest)?;
        let signed = self.with_signature(&raw, chain_id)?;

        tracing::info!(
            "Signed private transaction (nonce: {}, chain id: {}, v: {}, recipients: {})",
            self.nonce,
            chain_id,
            signed.signature().v,
            self.private_for.len()
        );

        Ok(signed)
    }

    /// Attach a raw `r || s || recovery id` signature.
    ///
    /// `v = recovery id + 27 + 2 * chain_id + 8`, the form the node's privacy
    /// extension recovers from (not the `+ 35` EIP-155 form).
    pub fn with_signature(&self, raw: &[u8], chain_id: u64) -> AppResult<SignedPrivateTransaction> {
        if raw.len() != SIGNATURE_LENGTH {
            return Err(AppError::Format(format!(
                "wrong size for signature: got {}, want {}",
                raw.len(),
                SIGNATURE_LENGTH
            )));
        }

        let r = U256::from_big_endian(&raw[..32]);
        let s = U256::from_big_endian(&raw[32..64]);
        let recovery = U256::from(raw[64]) + U256::from(LEGACY_V_OFFSET);
        let v = recovery + U256::from(chain_id) * U256::from(2u64) + U256::from(CHAIN_ID_V_OFFSET);

        Ok(SignedPrivateTransaction::new(
            self.clone(),
            TxSignature { v, r, s },
        ))
    }
}
