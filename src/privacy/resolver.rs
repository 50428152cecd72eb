use ethers::types::Address;
use ethers::utils::to_checksum;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::rpc::{
    RpcTransport, PRIV_CREATE_PRIVACY_GROUP, PRIV_FIND_PRIVACY_GROUP, PRIV_GET_TRANSACTION_COUNT,
};
use crate::utils::decode_hex_u64;

use super::{group, PrivacyGroup, PublicKey};

/// Resolves privacy groups and group-scoped nonces against a node
pub struct PrivacyResolver {
    transport: Arc<dyn RpcTransport>,
}

impl PrivacyResolver {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Local derivation, see [`group::root_group`]
    pub fn root_group(&self, participants: &[PublicKey]) -> AppResult<PrivacyGroup> {
        group::root_group(participants)
    }

    /// Look up an existing group with exactly these participants.
    ///
    /// Returns `None` when the node knows no such group. Only the first
    /// returned record is used; malformed member entries are skipped.
    pub async fn find_group(&self, participants: &[PublicKey]) -> AppResult<Option<PrivacyGroup>> {
        let keys: Vec<String> = participants.iter().map(PublicKey::to_base64).collect();

        let response = self
            .transport
            .call(PRIV_FIND_PRIVACY_GROUP, json!([keys]))
            .await?;

        if response.is_null() {
            tracing::debug!("No privacy group found for {} participants", participants.len());
            return Ok(None);
        }

        let records = response
            .as_array()
            .ok_or_else(|| AppError::malformed("privacy groups", "expected an array"))?;

        let Some(record) = records.first() else {
            tracing::debug!("No privacy group found for {} participants", participants.len());
            return Ok(None);
        };

        let record = record
            .as_object()
            .ok_or_else(|| AppError::malformed("privacy group", "expected an object"))?;

        let group = group_from_record(record)?;
        tracing::info!(
            "Found privacy group {} ({} members, {} candidates)",
            group.id,
            group.members.len(),
            records.len()
        );
        Ok(Some(group))
    }

    /// Create a named group on the node
    pub async fn create_group(&self, members: &[PublicKey], name: &str) -> AppResult<PrivacyGroup> {
        let addresses: Vec<String> = members.iter().map(PublicKey::to_base64).collect();

        let response = self
            .transport
            .call(
                PRIV_CREATE_PRIVACY_GROUP,
                json!([{ "addresses": addresses, "name": name }]),
            )
            .await?;

        let id = response
            .as_str()
            .ok_or_else(|| AppError::malformed("privacyGroupId", "expected a string"))?;

        tracing::info!("Created privacy group {} ({})", id, name);

        Ok(PrivacyGroup {
            id: id.to_string(),
            name: name.to_string(),
            members: members.to_vec(),
            ..Default::default()
        })
    }

    /// Next nonce of `account` within `group`
    pub async fn private_nonce(&self, account: Address, group: &PrivacyGroup) -> AppResult<u64> {
        let response = self
            .transport
            .call(
                PRIV_GET_TRANSACTION_COUNT,
                json!([to_checksum(&account, None), group.id]),
            )
            .await?;

        let count = response
            .as_str()
            .ok_or_else(|| AppError::malformed("transaction count", "expected a hex string"))?;
        let nonce = decode_hex_u64(count)?;

        tracing::debug!("Private nonce for {:?} in group {}: {}", account, group.id, nonce);
        Ok(nonce)
    }

    /// Nonce of `account` within the root group of `participants`
    pub async fn private_nonce_by_participants(
        &self,
        account: Address,
        participants: &[PublicKey],
    ) -> AppResult<u64> {
        let root = self.root_group(participants)?;
        self.private_nonce(account, &root).await
    }
}

fn optional_str(record: &Map<String, Value>, field: &str) -> AppResult<String> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AppError::malformed(field, "expected a string")),
    }
}

fn group_from_record(record: &Map<String, Value>) -> AppResult<PrivacyGroup> {
    let id = record
        .get("privacyGroupId")
        .ok_or_else(|| AppError::missing("privacyGroupId"))?
        .as_str()
        .ok_or_else(|| AppError::malformed("privacyGroupId", "expected a string"))?;

    let entries = record
        .get("members")
        .ok_or_else(|| AppError::missing("members"))?
        .as_array()
        .ok_or_else(|| AppError::malformed("members", "expected an array"))?;

    let members = entries
        .iter()
        .filter_map(|entry| {
            let key = entry.as_str().map(PublicKey::from_base64);
            match key {
                Some(Ok(key)) => Some(key),
                _ => {
                    tracing::warn!("Skipping malformed privacy group member: {}", entry);
                    None
                }
            }
        })
        .collect();

    Ok(PrivacyGroup {
        id: id.to_string(),
        name: optional_str(record, "name")?,
        description: optional_str(record, "description")?,
        group_type: optional_str(record, "type")?,
        members,
    })
}
