//! Mapping of `priv_getTransactionReceipt` results

use ethers::types::{Address, Bloom, Log, H256, U256};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::privacy::PublicKey;
use crate::transaction::Restriction;
use crate::utils::{decode_hex_data, decode_hex_u256, decode_hex_u64};

const BLOOM_LENGTH: usize = 256;

/// Outcome of a private transaction as reported by the node
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateReceipt {
    /// 1 on success, 0 otherwise
    pub status: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<Log>,
    pub transaction_hash: H256,
    pub contract_address: Option<Address>,
    pub block_hash: Option<H256>,
    pub block_number: Option<U256>,
    pub transaction_index: Option<u64>,
    pub private_from: PublicKey,
    pub private_for: Vec<PublicKey>,
    pub restriction: Restriction,
    pub commitment_hash: H256,
    pub output: Vec<u8>,
}

fn required<'a>(r: &'a Map<String, Value>, field: &str) -> AppResult<&'a Value> {
    match r.get(field) {
        None | Some(Value::Null) => Err(AppError::missing(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(r: &'a Map<String, Value>, field: &str) -> AppResult<&'a str> {
    required(r, field)?
        .as_str()
        .ok_or_else(|| AppError::malformed(field, "expected a string"))
}

fn optional_str<'a>(r: &'a Map<String, Value>, field: &str) -> AppResult<Option<&'a str>> {
    match r.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(AppError::malformed(field, "expected a string")),
    }
}

fn parse_hash(field: &str, value: &str) -> AppResult<H256> {
    value
        .parse::<H256>()
        .map_err(|e| AppError::malformed(field, e))
}

fn parse_bloom(value: &str) -> AppResult<Bloom> {
    let bytes = decode_hex_data(value).map_err(|e| AppError::malformed("logsBloom", e))?;
    if bytes.len() > BLOOM_LENGTH {
        return Err(AppError::malformed(
            "logsBloom",
            format!("{} bytes exceeds {}", bytes.len(), BLOOM_LENGTH),
        ));
    }
    let mut bloom = [0u8; BLOOM_LENGTH];
    bloom[BLOOM_LENGTH - bytes.len()..].copy_from_slice(&bytes);
    Ok(Bloom::from(bloom))
}

impl PrivateReceipt {
    /// Map a receipt object.
    ///
    /// `commitmentHash`, `transactionHash`, `privateFrom`, `privateFor`, `logs`
    /// and `logsBloom` are required. Malformed `privateFor` and `logs` entries
    /// are skipped one by one.
    pub fn from_json(r: &Map<String, Value>) -> AppResult<Self> {
        let commitment_hash = parse_hash("commitmentHash", required_str(r, "commitmentHash")?)?;
        let transaction_hash = parse_hash("transactionHash", required_str(r, "transactionHash")?)?;

        let private_from = PublicKey::from_base64(required_str(r, "privateFrom")?)
            .map_err(|e| AppError::malformed("privateFrom", e))?;

        let private_for = required(r, "privateFor")?
            .as_array()
            .ok_or_else(|| AppError::malformed("privateFor", "expected an array"))?
            .iter()
            .filter_map(|entry| match entry.as_str().map(PublicKey::from_base64) {
                Some(Ok(key)) => Some(key),
                _ => {
                    tracing::warn!("Skipping malformed privateFor entry: {}", entry);
                    None
                }
            })
            .collect();

        let logs = required(r, "logs")?
            .as_array()
            .ok_or_else(|| AppError::malformed("logs", "expected an array"))?
            .iter()
            .filter_map(|entry| match serde_json::from_value::<Log>(entry.clone()) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!("Skipping malformed log entry: {}", e);
                    None
                }
            })
            .collect();

        let logs_bloom = parse_bloom(required_str(r, "logsBloom")?)?;

        let status = match optional_str(r, "status")? {
            Some("0x1") => 1,
            _ => 0,
        };

        let contract_address = optional_str(r, "contractAddress")?
            .map(|a| {
                a.parse::<Address>()
                    .map_err(|e| AppError::malformed("contractAddress", e))
            })
            .transpose()?;

        let output = optional_str(r, "output")?
            .map(|o| decode_hex_data(o).map_err(|e| AppError::malformed("output", e)))
            .transpose()?
            .unwrap_or_default();

        let block_hash = optional_str(r, "blockHash")?
            .map(|h| parse_hash("blockHash", h))
            .transpose()?;

        let block_number = optional_str(r, "blockNumber")?
            .map(|n| decode_hex_u256(n).map_err(|e| AppError::malformed("blockNumber", e)))
            .transpose()?;

        let transaction_index = optional_str(r, "transactionIndex")?
            .map(|i| decode_hex_u64(i).map_err(|e| AppError::malformed("transactionIndex", e)))
            .transpose()?;

        Ok(Self {
            status,
            logs_bloom,
            logs,
            transaction_hash,
            contract_address,
            block_hash,
            block_number,
            transaction_index,
            private_from,
            private_for,
            restriction: Restriction::Restricted,
            commitment_hash,
            output,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FROM: &str = "A1aVtMxLCUHmBVHXoZzzBgPbW/wj5axDpW9X8l91SGo=";
    const TO: &str = "Ko2bVqD+nNlNYL5EE7y3IdOnviftjiizpjRt+HTuFBs=";
    const TX_HASH: &str = "0x5a1d8d3b7cb6d1a1f4c4e9b6a1f0f1d9c5d0b1e8a3f2c4d5e6f708192a3b4c5d";
    const COMMITMENT: &str = "0x9f1c2b3a4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8";

    fn receipt_json() -> Map<String, Value> {
        let bloom = format!("0x{}", "00".repeat(255) + "01");
        json!({
            "contractAddress": "0x42699a7612a82f1d9c36148af9c77354759b210b",
            "from": "0xfe3b557e8fb62b89f4916b721be55ceb828dbd73",
            "output": "0x6080",
            "commitmentHash": COMMITMENT,
            "transactionHash": TX_HASH,
            "privateFrom": FROM,
            "privateFor": [TO, 17, "***"],
            "status": "0x1",
            "logs": [
                {
                    "address": "0x42699a7612a82f1d9c36148af9c77354759b210b",
                    "topics": ["0x0000000000000000000000000000000000000000000000000000000000000001"],
                    "data": "0x",
                    "blockNumber": "0x10"
                },
                { "address": 12 }
            ],
            "logsBloom": bloom,
            "blockHash": "0x1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90a",
            "blockNumber": "0x10",
            "transactionIndex": "0x0"
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_from_json_maps_all_fields() {
        let receipt = PrivateReceipt::from_json(&receipt_json()).unwrap();

        assert!(receipt.is_success());
        assert_eq!(receipt.transaction_hash, TX_HASH.parse::<H256>().unwrap());
        assert_eq!(receipt.commitment_hash, COMMITMENT.parse::<H256>().unwrap());
        assert_eq!(
            receipt.contract_address,
            Some("0x42699a7612a82f1d9c36148af9c77354759b210b".parse().unwrap())
        );
        assert_eq!(receipt.output, vec![0x60, 0x80]);
        assert_eq!(receipt.private_from.to_base64(), FROM);
        assert_eq!(receipt.private_for.len(), 1);
        assert_eq!(receipt.private_for[0].to_base64(), TO);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs_bloom.as_bytes()[255], 0x01);
        assert_eq!(receipt.block_number, Some(U256::from(16)));
        assert_eq!(receipt.transaction_index, Some(0));
        assert_eq!(receipt.restriction, Restriction::Restricted);
    }

    #[test]
    fn test_missing_required_fields_are_named() {
        for field in [
            "logs",
            "commitmentHash",
            "transactionHash",
            "privateFrom",
            "privateFor",
            "logsBloom",
        ] {
            let mut r = receipt_json();
            r.remove(field);
            let err = PrivateReceipt::from_json(&r).unwrap_err();
            assert!(
                matches!(&err, AppError::Decode(msg) if msg == &format!("{} not found", field)),
                "{}: {}",
                field,
                err
            );
        }
    }

    #[test]
    fn test_empty_logs_are_not_missing_logs() {
        let mut r = receipt_json();
        r.insert("logs".to_string(), json!([]));
        assert!(PrivateReceipt::from_json(&r).unwrap().logs.is_empty());
    }

    #[test]
    fn test_optional_fields_default() {
        let mut r = receipt_json();
        for field in [
            "contractAddress",
            "output",
            "status",
            "blockHash",
            "blockNumber",
            "transactionIndex",
        ] {
            r.remove(field);
        }
        r.insert("contractAddress".to_string(), Value::Null);

        let receipt = PrivateReceipt::from_json(&r).unwrap();

        assert_eq!(receipt.status, 0);
        assert_eq!(receipt.contract_address, None);
        assert!(receipt.output.is_empty());
        assert_eq!(receipt.block_hash, None);
        assert_eq!(receipt.block_number, None);
        assert_eq!(receipt.transaction_index, None);
    }

    #[test]
    fn test_failed_status() {
        let mut r = receipt_json();
        r.insert("status".to_string(), json!("0x0"));
        assert!(!PrivateReceipt::from_json(&r).unwrap().is_success());
    }

    #[test]
    fn test_malformed_hash_is_decode_error() {
        let mut r = receipt_json();
        r.insert("transactionHash".to_string(), json!("0x1234"));
        let err = PrivateReceipt::from_json(&r).unwrap_err();
        assert!(matches!(err, AppError::Decode(msg) if msg.contains("transactionHash")));
    }
}
