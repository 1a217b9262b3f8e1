//! Ledger client for the paper-registry contract
//!
//! The ledger is an Ethereum-style node reached over JSON-RPC. Reads go
//! through `eth_call`; writes are `eth_sendTransaction` from node-managed
//! accounts, bracketed by `personal_unlockAccount` / `personal_lockAccount`.
//! Unlock/act/lock sequences on one account are serialized by
//! [`AccountLocks`] so concurrent requests cannot undo each other's state.

pub mod abi;
pub mod accounts;
pub mod contract;
pub mod rpc;

use async_trait::async_trait;

pub use accounts::AccountLocks;
pub use contract::EthPaperContract;
pub use rpc::JsonRpcClient;

use crate::types::Result;

/// Operations the workflow service needs from the deployed contract and
/// the node's account management. Production impl is [`EthPaperContract`];
/// tests substitute an in-memory double.
#[async_trait]
pub trait PaperLedger: Send + Sync {
    /// Authorize an account for signing using its unlock credential
    async fn unlock_account(&self, account: &str, password: &str) -> Result<()>;

    /// Re-lock an account, ending its signing authorization
    async fn lock_account(&self, account: &str) -> Result<()>;

    /// Transfer `amount` units from one account to another
    async fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<()>;

    /// Register a paper on-chain, charged to `from`
    async fn create_paper(&self, from: &str, content_id: &str) -> Result<()>;

    /// Author address of a registered paper
    async fn author_of(&self, content_id: &str) -> Result<String>;

    /// Owner address of a registered paper
    async fn owner_of(&self, content_id: &str) -> Result<String>;

    /// Review status: false = pending, true = reviewed/closed
    async fn status_of(&self, content_id: &str) -> Result<bool>;

    /// Current rating of a registered paper
    async fn rating_of(&self, content_id: &str) -> Result<u64>;

    /// Reviewer addresses assigned to a registered paper
    async fn reviewers_of(&self, content_id: &str) -> Result<Vec<String>>;

    /// Add a reviewer account to a paper; returns the resulting status flag
    async fn add_reviewer(&self, from: &str, content_id: &str, reviewer: &str) -> Result<bool>;

    /// Set the rating of a paper, charged to `from`
    async fn set_rating(&self, from: &str, content_id: &str, rating: u64) -> Result<()>;
}
