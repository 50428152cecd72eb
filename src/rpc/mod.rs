pub mod node;

use async_trait::async_trait;
use ethers::types::H256;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::receipt::PrivateReceipt;
use crate::transaction::SignedPrivateTransaction;

pub use node::NodeClient;

pub const PRIV_GET_TRANSACTION_COUNT: &str = "priv_getTransactionCount";
pub const PRIV_FIND_PRIVACY_GROUP: &str = "priv_findPrivacyGroup";
pub const PRIV_CREATE_PRIVACY_GROUP: &str = "priv_createPrivacyGroup";
pub const PRIV_GET_TRANSACTION_RECEIPT: &str = "priv_getTransactionReceipt";
pub const EEA_SEND_RAW_TRANSACTION: &str = "eea_sendRawTransaction";

/// Narrow JSON-RPC capability used by the resolver and the submit helpers.
///
/// One request per call, no batching. Implementations own timeouts and
/// cancellation; callers may also drop the future.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> AppResult<Value>;
}

/// Submit a signed private transaction, returning the marker transaction hash
pub async fn send_raw_private_transaction(
    transport: &dyn RpcTransport,
    tx: &SignedPrivateTransaction,
) -> AppResult<H256> {
    let raw = tx.raw_hex()?;
    tracing::info!(
        "Submitting private transaction (nonce: {}, {} bytes)",
        tx.transaction().nonce,
        (raw.len() - 2) / 2
    );

    let response = transport
        .call(EEA_SEND_RAW_TRANSACTION, json!([raw]))
        .await?;

    let hash = response
        .as_str()
        .ok_or_else(|| AppError::malformed("transactionHash", "expected a string"))?;
    let hash = hash
        .parse::<H256>()
        .map_err(|e| AppError::malformed("transactionHash", e))?;

    tracing::info!("Private transaction submitted: {:?}", hash);
    Ok(hash)
}

/// Fetch the private receipt for a marker transaction; `None` while pending
pub async fn private_transaction_receipt(
    transport: &dyn RpcTransport,
    tx_hash: H256,
) -> AppResult<Option<PrivateReceipt>> {
    let response = transport
        .call(PRIV_GET_TRANSACTION_RECEIPT, json!([format!("{:?}", tx_hash)]))
        .await?;

    match response {
        Value::Null => Ok(None),
        Value::Object(map) => PrivateReceipt::from_json(&map).map(Some),
        other => Err(AppError::malformed(
            "receipt",
            format!("expected an object, got {}", other),
        )),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport double returning queued responses and recording every call
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<AppResult<Value>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, value: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(value));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(AppError::Transport(message.to_string())));
            self
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn call(&self, method: &str, params: Value) -> AppResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Transport(format!("no scripted response for {}", method))))
        }
    }
}
