//! Paper-registry contract wrapper
//!
//! Encodes calls against the deployed contract instance and maps RPC
//! failures onto the workflow error taxonomy: unlocks that fail are
//! credential rejections, failed writes are transfer/ledger rejections,
//! failed reads are lookup failures.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::ledger::abi::{
    decode_address, decode_address_array, decode_bool, decode_hex, decode_uint, encode_call, Token,
};
use crate::ledger::rpc::{JsonRpcClient, RpcError};
use crate::ledger::PaperLedger;
use crate::types::{GatewayError, Result};

/// JSON-RPC client bound to one deployed contract instance
pub struct EthPaperContract {
    rpc: JsonRpcClient,
    contract: String,
    gas_limit: u64,
}

impl EthPaperContract {
    /// Create a wrapper for the contract at `contract_address`
    pub fn new(rpc_url: &str, contract_address: &str, gas_limit: u64, timeout_ms: u64) -> Result<Self> {
        let rpc = JsonRpcClient::new(rpc_url, timeout_ms)?;

        info!(
            rpc = %rpc_url,
            contract = %contract_address,
            gas_limit,
            "Paper contract client created"
        );

        Ok(Self {
            rpc,
            contract: contract_address.to_string(),
            gas_limit,
        })
    }

    /// Read-only contract call, returning the raw return bytes
    async fn eth_call(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let params = json!([
            { "to": self.contract, "data": format!("0x{}", hex::encode(data)) },
            "latest",
        ]);

        let result = self
            .rpc
            .call("eth_call", params)
            .await
            .map_err(|e| GatewayError::LookupFailed(e.to_string()))?;

        match result {
            Value::String(s) => decode_hex(&s),
            other => Err(GatewayError::LookupFailed(format!(
                "non-string eth_call result: {}",
                other
            ))),
        }
    }

    /// State-changing contract call from an unlocked account
    async fn send_contract_tx(&self, from: &str, data: Vec<u8>) -> std::result::Result<(), RpcError> {
        let params = json!([{
            "from": from,
            "to": self.contract,
            "gas": format!("0x{:x}", self.gas_limit),
            "data": format!("0x{}", hex::encode(data)),
        }]);

        let tx_hash = self.rpc.call("eth_sendTransaction", params).await?;
        debug!(tx = %tx_hash, "Contract transaction submitted");
        Ok(())
    }
}

#[async_trait]
impl PaperLedger for EthPaperContract {
    async fn unlock_account(&self, account: &str, password: &str) -> Result<()> {
        // Third parameter (duration) left null to use the node's default
        let params = json!([account, password, Value::Null]);

        let result = self
            .rpc
            .call("personal_unlockAccount", params)
            .await
            .map_err(|_| GatewayError::AuthenticationRejected(account.to_string()))?;

        match result {
            Value::Bool(true) => {
                debug!(account = %account, "Account unlocked");
                Ok(())
            }
            _ => Err(GatewayError::AuthenticationRejected(account.to_string())),
        }
    }

    async fn lock_account(&self, account: &str) -> Result<()> {
        self.rpc
            .call("personal_lockAccount", json!([account]))
            .await
            .map_err(|e| GatewayError::LedgerRejected(format!("lock failed: {}", e)))?;

        debug!(account = %account, "Account locked");
        Ok(())
    }

    async fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<()> {
        let params = json!([{
            "from": from,
            "to": to,
            "value": format!("0x{:x}", amount),
        }]);

        self.rpc
            .call("eth_sendTransaction", params)
            .await
            .map_err(|e| GatewayError::TransferFailed(e.to_string()))?;

        debug!(from = %from, to = %to, amount, "Reward transferred");
        Ok(())
    }

    async fn create_paper(&self, from: &str, content_id: &str) -> Result<()> {
        let data = encode_call("createPaper(string)", &[Token::String(content_id.into())]);

        self.send_contract_tx(from, data)
            .await
            .map_err(|e| GatewayError::LedgerRejected(e.to_string()))
    }

    async fn author_of(&self, content_id: &str) -> Result<String> {
        let data = encode_call("getAuthor(string)", &[Token::String(content_id.into())]);
        decode_address(&self.eth_call(data).await?)
    }

    async fn owner_of(&self, content_id: &str) -> Result<String> {
        let data = encode_call("getOwner(string)", &[Token::String(content_id.into())]);
        decode_address(&self.eth_call(data).await?)
    }

    async fn status_of(&self, content_id: &str) -> Result<bool> {
        let data = encode_call("getStatus(string)", &[Token::String(content_id.into())]);
        decode_bool(&self.eth_call(data).await?)
    }

    async fn rating_of(&self, content_id: &str) -> Result<u64> {
        let data = encode_call("getRating(string)", &[Token::String(content_id.into())]);
        decode_uint(&self.eth_call(data).await?)
    }

    async fn reviewers_of(&self, content_id: &str) -> Result<Vec<String>> {
        let data = encode_call("getReviewers(string)", &[Token::String(content_id.into())]);
        decode_address_array(&self.eth_call(data).await?)
    }

    async fn add_reviewer(&self, from: &str, content_id: &str, reviewer: &str) -> Result<bool> {
        let addr = parse_address(reviewer)?;
        let data = encode_call(
            "addReviewers(string,address)",
            &[Token::String(content_id.into()), Token::Address(addr)],
        );

        self.send_contract_tx(from, data)
            .await
            .map_err(|e| GatewayError::LedgerRejected(e.to_string()))?;

        // The transaction was accepted; report the paper's current status flag
        self.status_of(content_id).await
    }

    async fn set_rating(&self, from: &str, content_id: &str, rating: u64) -> Result<()> {
        let data = encode_call(
            "setRating(string,uint256)",
            &[Token::String(content_id.into()), Token::Uint(rating)],
        );

        self.send_contract_tx(from, data)
            .await
            .map_err(|e| GatewayError::LedgerRejected(e.to_string()))
    }
}

/// Parse a 0x-prefixed hex address into its 20 raw bytes
fn parse_address(addr: &str) -> Result<[u8; 20]> {
    let stripped = addr.strip_prefix("0x").unwrap_or(addr);
    let bytes = hex::decode(stripped)
        .map_err(|e| GatewayError::BadRequest(format!("invalid address '{}': {}", addr, e)))?;

    bytes
        .try_into()
        .map_err(|_| GatewayError::BadRequest(format!("address '{}' is not 20 bytes", addr)))
}
