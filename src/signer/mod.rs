//! Signing capabilities over a 32-byte digest
//!
//! The transaction engine only needs a raw 65-byte recoverable signature
//! (`r || s || recovery id`); key storage stays with the caller.

use ethers::signers::LocalWallet;
use ethers::types::{Address, H256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

use crate::error::{AppError, AppResult};

/// Length of a raw recoverable signature
pub const SIGNATURE_LENGTH: usize = 65;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Opaque signing capability
pub trait DigestSigner {
    /// Sign `digest`, returning `r || s || v` with `v` the raw recovery id (0 or 1)
    fn sign_digest(&self, digest: &H256) -> AppResult<Vec<u8>>;
}

/// In-memory secp256k1 key
pub struct LocalSigner {
    secret_key: SecretKey,
}

impl LocalSigner {
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }

    /// Generate a fresh random key
    pub fn random() -> Self {
        Self::new(SecretKey::new(&mut rand::thread_rng()))
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(private_key_hex: &str) -> AppResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| AppError::Signature(format!("Invalid private key hex: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(AppError::Signature(format!(
                "Private key must be 32 bytes, got {} bytes",
                key_bytes.len()
            )));
        }

        let secret_key = SecretKey::from_slice(&key_bytes)?;
        Ok(Self::new(secret_key))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&SECP, &self.secret_key)
    }

    /// Account address: last 20 bytes of keccak256 of the uncompressed public key
    pub fn address(&self) -> Address {
        public_key_address(&self.public_key())
    }
}

impl DigestSigner for LocalSigner {
    fn sign_digest(&self, digest: &H256) -> AppResult<Vec<u8>> {
        let message = Message::from_digest_slice(digest.as_bytes())?;
        let signature = SECP.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut raw = compact.to_vec();
        raw.push(recovery_id.to_i32() as u8);
        Ok(raw)
    }
}

impl DigestSigner for LocalWallet {
    fn sign_digest(&self, digest: &H256) -> AppResult<Vec<u8>> {
        let signature = self.sign_hash(*digest)?;
        let mut raw = signature.to_vec();
        // ethers reports v as 27/28
        if let Some(v) = raw.last_mut() {
            if *v >= 27 {
                *v -= 27;
            }
        }
        Ok(raw)
    }
}

pub(crate) fn public_key_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Recover the signing address from a raw 65-byte signature over `digest`
pub fn recover_address(digest: &H256, raw: &[u8]) -> AppResult<Address> {
    if raw.len() != SIGNATURE_LENGTH {
        return Err(AppError::Format(format!(
            "wrong size for signature: got {}, want {}",
            raw.len(),
            SIGNATURE_LENGTH
        )));
    }
    let recovery_id = secp256k1::ecdsa::RecoveryId::from_i32(i32::from(raw[64]))?;
    let signature = secp256k1::ecdsa::RecoverableSignature::from_compact(&raw[..64], recovery_id)?;
    let message = Message::from_digest_slice(digest.as_bytes())?;
    let public_key = SECP.recover_ecdsa(&message, &signature)?;
    Ok(public_key_address(&public_key))
}
