//! Restricted private transactions for EEA-compatible privacy nodes.
//!
//! - [`encoding`]: canonical RLP encoding and Keccak-256 digests
//! - [`privacy`]: participant keys, root group derivation, group lookup/creation
//! - [`transaction`]: unsigned and signed private transactions
//! - [`rpc`]: the JSON-RPC seam and submit/receipt helpers

pub mod config;
pub mod encoding;
pub mod error;
pub mod privacy;
pub mod receipt;
pub mod rpc;
pub mod signer;
pub mod transaction;
pub mod utils;

pub use error::{AppError, AppResult};
pub use privacy::{PrivacyGroup, PrivacyResolver, PublicKey};
pub use receipt::PrivateReceipt;
pub use rpc::{NodeClient, RpcTransport};
pub use signer::{DigestSigner, LocalSigner};
pub use transaction::{PrivateTransaction, Restriction, SignedPrivateTransaction};
