use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::BTreeMap;

use crate::encoding::{self, Field};
use crate::error::AppResult;

use super::PublicKey;

/// A set of participants allowed to see a private transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivacyGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub group_type: String,
    /// Members as last resolved; order is for display only
    pub members: Vec<PublicKey>,
}

impl PrivacyGroup {
    /// Whether the group carries no server-side metadata
    pub fn is_root(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.group_type.is_empty()
    }
}

/// Order participants by ascending [`PublicKey::ordering_hash`].
///
/// Keys whose hashes collide overwrite each other and only the one seen last
/// survives. Counterparties derive group ids the same way, so this must not be
/// "fixed" without breaking interoperability.
pub fn deterministic_order<'a, I>(participants: I) -> Vec<PublicKey>
where
    I: IntoIterator<Item = &'a PublicKey>,
{
    let mut by_hash: BTreeMap<i32, &PublicKey> = BTreeMap::new();
    for key in participants {
        if let Some(previous) = by_hash.insert(key.ordering_hash(), key) {
            if previous != key {
                tracing::warn!(
                    "Ordering hash collision: {} replaced by {}",
                    previous,
                    key
                );
            }
        }
    }
    by_hash.into_values().cloned().collect()
}

/// Derive the root group for `participants` without contacting the node.
///
/// The id is the base64 Keccak-256 digest of the canonical list of ordered
/// raw keys. The returned group carries no name, description or type.
pub fn root_group(participants: &[PublicKey]) -> AppResult<PrivacyGroup> {
    let ordered = deterministic_order(participants);
    let keys: Vec<Field> = ordered
        .iter()
        .map(|key| Field::Bytes(key.as_bytes().to_vec()))
        .collect();
    let digest = encoding::keccak_digest(&keys)?;

    let group = PrivacyGroup {
        id: STANDARD.encode(digest.as_bytes()),
        members: ordered,
        ..Default::default()
    };

    tracing::debug!(
        "Derived root privacy group {} from {} participants",
        group.id,
        participants.len()
    );

    Ok(group)
}
