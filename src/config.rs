//! Configuration for Papergate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Papergate - HTTP gateway for an on-chain academic paper registry
#[derive(Parser, Debug, Clone)]
#[command(name = "papergate")]
#[command(about = "HTTP gateway bridging the paper-registry contract, IPFS and MongoDB")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "papergate")]
    pub mongodb_db: String,

    /// IPFS node host (shared by the API and the public gateway)
    #[arg(long, env = "IPFS_HOST", default_value = "localhost")]
    pub ipfs_host: String,

    /// IPFS HTTP API port (`/api/v0/add`)
    #[arg(long, env = "IPFS_API_PORT", default_value = "5001")]
    pub ipfs_api_port: u16,

    /// IPFS public gateway port (`/ipfs/<cid>` downloads)
    #[arg(long, env = "IPFS_GATEWAY_PORT", default_value = "8080")]
    pub ipfs_gateway_port: u16,

    /// Ledger JSON-RPC endpoint
    #[arg(long, env = "ETH_RPC_URL", default_value = "http://localhost:8545")]
    pub eth_rpc_url: String,

    /// Deployed paper-registry contract address (0x-prefixed)
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract_address: String,

    /// Collection account address receiving submission/review rewards
    #[arg(long, env = "COINBASE")]
    pub coinbase: String,

    /// Unlock credential for the collection account
    #[arg(long, env = "COINBASE_PWD", hide_env_values = true)]
    pub coinbase_password: String,

    /// Gas allowance for contract invocations
    #[arg(long, env = "GAS_LIMIT", default_value = "100000")]
    pub gas_limit: u64,

    /// JWT secret for session token verification (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (used when minting dev tokens)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (default JWT secret, header identity fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout for outbound ledger/IPFS calls, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// IPFS HTTP API base URL
    pub fn ipfs_api_url(&self) -> String {
        format!("http://{}:{}", self.ipfs_host, self.ipfs_api_port)
    }

    /// Public gateway base URL for stored content
    pub fn ipfs_gateway_url(&self) -> String {
        format!("http://{}:{}", self.ipfs_host, self.ipfs_gateway_port)
    }

    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if !is_hex_address(&self.contract_address) {
            return Err(format!(
                "CONTRACT_ADDRESS is not a 0x-prefixed 20-byte hex address: {}",
                self.contract_address
            ));
        }

        if !is_hex_address(&self.coinbase) {
            return Err(format!(
                "COINBASE is not a 0x-prefixed 20-byte hex address: {}",
                self.coinbase
            ));
        }

        if self.gas_limit == 0 {
            return Err("GAS_LIMIT must be greater than zero".to_string());
        }

        Ok(())
    }
}

/// Check for a 0x-prefixed 20-byte hex address
pub fn is_hex_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}
