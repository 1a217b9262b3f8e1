//! Papergate - HTTP gateway for an on-chain academic paper registry
//!
//! Papergate coordinates three external systems behind a small JSON API:
//!
//! - **Ledger**: an Ethereum-style node hosting the paper-registry contract,
//!   reached over JSON-RPC (`eth_call` / `eth_sendTransaction` plus the
//!   `personal_*` account unlock/lock calls)
//! - **Content store**: an IPFS node assigning content-derived identifiers
//!   to uploaded paper files
//! - **Metadata store**: MongoDB collections holding paper titles and
//!   per-user owned-paper lists
//!
//! ## Services
//!
//! - **Submission**: store file bytes, register the paper on-chain, credit
//!   the collection account, track ownership
//! - **Listing**: reviewer queue (pending papers) or per-user enriched list
//! - **Details**: aggregate on-chain state and metadata for one paper
//! - **Review**: reviewer assignment and rating updates

pub mod auth;
pub mod config;
pub mod db;
pub mod ledger;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
