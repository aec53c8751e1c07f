//! HTTP clients for the investigation and action services.
//!
//! Both services sit behind traits so the desk can be exercised without a
//! network: the investigation fetch is idempotent and side-effect-free,
//! the block call is fire-and-forget.

use crate::types::case::CaseBundle;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Case fetch failure. Non-recoverable for the attempt; the operator
/// stays on the picker and may retry manually.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("investigation service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("investigation service returned HTTP {0}")]
    Status(u16),
    #[error("investigation service error: {0}")]
    Service(String),
    #[error("case payload violates the data contract: {0}")]
    Contract(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("action service returned HTTP {0}")]
    Status(u16),
    #[error("block command rejected: {0}")]
    Rejected(String),
}

/// Source of forensic case bundles, keyed by transaction id.
#[async_trait]
pub trait CaseSource: Send + Sync {
    async fn fetch_case(&self, id: &str) -> Result<CaseBundle, FetchError>;
}

/// Sink for block commands.
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// Freeze the source account behind the given transaction id.
    async fn block_account(&self, id: &str) -> Result<BlockAck, ActionError>;
}

/// Acknowledgement returned by the action service.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockAck {
    pub status: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A successful fetch either carries the full bundle or an explicit error
/// field; the error field wins.
#[derive(Deserialize)]
#[serde(untagged)]
enum CaseResponse {
    Failure { error: String },
    Bundle(Box<CaseBundle>),
}

/// Client for the investigation service's fetch-by-id operation
pub struct InvestigationClient {
    http: reqwest::Client,
    base_url: String,
}

impl InvestigationClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CaseSource for InvestigationClient {
    async fn fetch_case(&self, id: &str) -> Result<CaseBundle, FetchError> {
        let url = format!("{}/api/investigate/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        match serde_json::from_str::<CaseResponse>(&body) {
            Ok(CaseResponse::Failure { error }) => Err(FetchError::Service(error)),
            Ok(CaseResponse::Bundle(bundle)) => {
                debug!(case_id = %id, "Fetched forensic bundle");
                Ok(*bundle)
            }
            Err(e) => Err(FetchError::Contract(e.to_string())),
        }
    }
}

/// Client for the action service's block operation
pub struct ActionClient {
    http: reqwest::Client,
    base_url: String,
}

impl ActionClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ActionSink for ActionClient {
    async fn block_account(&self, id: &str) -> Result<BlockAck, ActionError> {
        let url = format!("{}/api/block/{}", self.base_url, id);
        let response = self.http.post(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::Status(status.as_u16()));
        }

        let ack: BlockAck = response.json().await?;
        if ack.status == "ERROR" {
            return Err(ActionError::Rejected(
                ack.message.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }

        info!(
            tx_id = %id,
            account = ack.account.as_deref().unwrap_or("?"),
            "Block command acknowledged"
        );
        Ok(ack)
    }
}
