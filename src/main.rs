use anyhow::Context;
use ethers::types::Address;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use besu_privacy::config::AppConfig;
use besu_privacy::{NodeClient, PrivacyResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with console and file output
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".into());
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // File appender - rotates when > 50MB, keeps 5 backup files
    let log_path = std::path::Path::new(&log_dir).join("privacy-group.log");
    let file_appender = rolling_file::RollingFileAppender::new(
        log_path,
        rolling_file::RollingConditionBasic::new().max_size(50 * 1024 * 1024),
        5,
    )
    .context("Failed to create log file appender")?;

    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
    );

    tracing_subscriber::registry()
        .with(env_filter)
        // Console output
        .with(tracing_subscriber::fmt::layer().with_target(true))
        // File output
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let participants = config.privacy.participants()?;

    let client = Arc::new(NodeClient::new(&config.node)?);
    let resolver = PrivacyResolver::new(client.clone());

    let root = resolver.root_group(&participants)?;
    println!("root privacy group: {}", root.id);
    for member in &root.members {
        println!("  member: {}", member);
    }

    // Optional account argument: look up the node-side group and report the nonce
    if let Some(account) = std::env::args().nth(1) {
        let account: Address = account
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid account address {}: {}", account, e))?;
        if let Some(group) = resolver.find_group(&participants).await? {
            if !group.is_root() {
                println!("named group on node: {} ({})", group.name, group.id);
            }
        }
        let nonce = resolver.private_nonce(account, &root).await?;
        println!("private nonce of {:?} on chain {}: {}", account, client.chain_id(), nonce);
    }

    Ok(())
}
