//! Papergate - HTTP gateway for an on-chain academic paper registry

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papergate::{
    config::Args,
    db::{MongoClient, MongoDirectory},
    ledger::EthPaperContract,
    server::{self, AppState},
    service::PaperService,
    store::IpfsStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("papergate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Papergate - Paper Registry Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Ledger RPC: {}", args.eth_rpc_url);
    info!("Contract: {}", args.contract_address);
    info!("Coinbase: {}", args.coinbase);
    info!("IPFS API: {}", args.ipfs_api_url());
    info!("IPFS gateway: {}", args.ipfs_gateway_url());
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // Connect to MongoDB
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            client
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let directory = match MongoDirectory::new(&mongo).await {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            error!("Failed to initialize collections: {}", e);
            std::process::exit(1);
        }
    };

    // Outbound clients (lazy connections, errors surface per-request)
    let store = match IpfsStore::new(
        &args.ipfs_api_url(),
        &args.ipfs_gateway_url(),
        args.request_timeout_ms,
    ) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to build IPFS client: {}", e);
            std::process::exit(1);
        }
    };

    let ledger = match EthPaperContract::new(
        &args.eth_rpc_url,
        &args.contract_address,
        args.gas_limit,
        args.request_timeout_ms,
    ) {
        Ok(ledger) => Arc::new(ledger),
        Err(e) => {
            error!("Failed to build ledger client: {}", e);
            std::process::exit(1);
        }
    };

    let papers = Arc::new(PaperService::new(
        directory,
        store,
        ledger,
        args.coinbase.clone(),
        args.coinbase_password.clone(),
    ));

    if args.dev_mode {
        warn!("Development mode: header identity fallback and default JWT secret enabled");
    }

    let state = Arc::new(AppState::new(args, papers));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
