use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::privacy::PublicKey;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// HTTP/HTTPS/SOCKS5 proxy for RPC requests (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    pub rpc_proxy: Option<String>,
    /// Per-request timeout applied by the HTTP client
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrivacyConfig {
    /// Sender's privacy-manager public key (base64)
    pub private_from: String,
    /// Recipients' privacy-manager public keys (base64)
    pub private_for: Vec<String>,
}

impl PrivacyConfig {
    /// Sender plus recipients, decoded
    pub fn participants(&self) -> Result<Vec<PublicKey>, ConfigError> {
        std::iter::once(&self.private_from)
            .chain(self.private_for.iter())
            .map(|key| {
                PublicKey::from_base64(key)
                    .map_err(|e| ConfigError::Message(format!("Invalid public key {}: {}", key, e)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub privacy: PrivacyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Node defaults
            .set_default("node.rpc_url", "http://127.0.0.1:8545")?
            .set_default("node.chain_id", 2018)?
            .set_default("node.rpc_proxy", Option::<String>::None)?
            .set_default("node.timeout_secs", 30)?
            // Privacy defaults
            .set_default("privacy.private_from", "")?
            .set_default("privacy.private_for", Vec::<String>::new())?
            // Load from config.toml if exists
            .add_source(File::with_name("config").required(false))
            // Override with environment variables (prefix: PRIVTX_)
            // Use __ as separator so PRIVTX_NODE__RPC_URL -> node.rpc_url
            .add_source(
                Environment::with_prefix("PRIVTX")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("privacy.private_for")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node.rpc_url.is_empty() {
            return Err(ConfigError::Message("RPC URL cannot be empty".to_string()));
        }

        if self.node.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "RPC timeout must be at least one second".to_string(),
            ));
        }

        if self.privacy.private_from.is_empty() {
            return Err(ConfigError::Message(
                "privacy.private_from must be set".to_string(),
            ));
        }

        for key in self.privacy.participants()? {
            if key.len() != PublicKey::LENGTH {
                return Err(ConfigError::Message(format!(
                    "Public key {} must be {} bytes, got {}",
                    key.to_base64(),
                    PublicKey::LENGTH,
                    key.len()
                )));
            }
        }

        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 2018,
            rpc_proxy: None,
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(private_from: &str, private_for: Vec<&str>) -> AppConfig {
        AppConfig {
            node: NodeConfig::default(),
            privacy: PrivacyConfig {
                private_from: private_from.to_string(),
                private_for: private_for.into_iter().map(String::from).collect(),
            },
        }
    }

    #[test]
    fn test_validate_accepts_32_byte_keys() {
        let config = config_with(
            "A1aVtMxLCUHmBVHXoZzzBgPbW/wj5axDpW9X8l91SGo=",
            vec!["Ko2bVqD+nNlNYL5EE7y3IdOnviftjiizpjRt+HTuFBs="],
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.privacy.participants().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_keys() {
        assert!(config_with("", vec![]).validate().is_err());
        assert!(config_with("not base64!", vec![]).validate().is_err());
        // valid base64, wrong length
        assert!(config_with("AQID", vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_rpc_url() {
        let mut config = config_with("A1aVtMxLCUHmBVHXoZzzBgPbW/wj5axDpW9X8l91SGo=", vec![]);
        config.node.rpc_url.clear();
        assert!(config.validate().is_err());
    }
}
