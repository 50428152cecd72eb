use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use reqwest::Proxy;
use serde_json::Value;
use url::Url;

use crate::config::NodeConfig;
use crate::error::{AppError, AppResult};

use super::RpcTransport;

/// JSON-RPC transport to a privacy-enabled node over HTTP
pub struct NodeClient {
    provider: Provider<Http>,
    rpc_url: String,
    chain_id: u64,
}

impl NodeClient {
    /// Create a reqwest client with optional proxy support
    fn create_http_client(proxy_url: &Option<String>, timeout_secs: u64) -> AppResult<reqwest::Client> {
        let mut client_builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs));

        if let Some(proxy) = proxy_url {
            if !proxy.is_empty() {
                let proxy = Proxy::all(proxy)
                    .map_err(|e| AppError::Transport(format!("Invalid proxy URL: {}", e)))?;
                client_builder = client_builder.proxy(proxy);
                tracing::debug!("RPC proxy configured");
            }
        }

        client_builder
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create HTTP client: {}", e)))
    }

    pub fn new(config: &NodeConfig) -> AppResult<Self> {
        let client = Self::create_http_client(&config.rpc_proxy, config.timeout_secs)?;
        let url = Url::parse(&config.rpc_url)
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = Provider::new(Http::new_with_client(url, client));

        tracing::info!(
            "Node client for {} (chain id: {}, proxy: {})",
            config.rpc_url,
            config.chain_id,
            if config.rpc_proxy.as_deref().map_or(true, str::is_empty) { "disabled" } else { "enabled" }
        );

        Ok(Self {
            provider,
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Chain id used when signing for this node
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl RpcTransport for NodeClient {
    async fn call(&self, method: &str, params: Value) -> AppResult<Value> {
        let start = std::time::Instant::now();
        tracing::debug!("--> {} {}", method, params);

        // failures are logged by the ProviderError conversion
        let result = self.provider.request::<Value, Value>(method, params).await?;
        tracing::debug!("<-- {} ok ({}ms)", method, start.elapsed().as_millis());

        Ok(result)
    }
}
