//! IPFS HTTP API client
//!
//! Talks to the node's `/api/v0/add` endpoint and derives public gateway
//! URLs (`http://host:gateway_port/ipfs/<cid>`) for stored content. The
//! returned hash is validated as a CID before it is used as a paper key.

use async_trait::async_trait;
use cid::Cid;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::store::ContentStore;
use crate::types::{GatewayError, Result};

/// Response entry from `/api/v0/add`
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Name")]
    #[allow(dead_code)]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size")]
    #[allow(dead_code)]
    size: String,
}

/// Client for an IPFS node's HTTP API and public gateway
pub struct IpfsStore {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
}

impl IpfsStore {
    /// Create a new store client
    pub fn new(api_url: &str, gateway_url: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!(api = %api_url, gateway = %gateway_url, "IPFS store client created");

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn add(&self, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes).file_name("paper");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::StorageUnavailable(format!("add failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::StorageUnavailable(format!(
                "add returned {}",
                response.status()
            )));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::StorageUnavailable(format!("bad add response: {}", e)))?;

        // The hash becomes the paper's primary key; refuse anything that is
        // not a parseable CID.
        Cid::try_from(added.hash.as_str()).map_err(|e| {
            GatewayError::StorageUnavailable(format!("invalid CID '{}': {}", added.hash, e))
        })?;

        debug!(cid = %added.hash, size, "Stored content in IPFS");

        Ok(added.hash)
    }

    fn public_url(&self, content_id: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, content_id)
    }
}
