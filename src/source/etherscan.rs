use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{FetchOutcome, SourceError};
use crate::config::SourceConfig;
use crate::core::TxRecord;

const NO_TRANSACTIONS: &str = "No transactions found";

/// Minimal client for the Etherscan `account/txlist` endpoint.
pub struct EtherscanClient {
    url: String,
    api_key: String,
    start_block: u64,
    end_block: u64,
    sort: String,
    client: Client,
}

impl EtherscanClient {
    pub fn new(config: &SourceConfig, api_key: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            url: config.api_url.clone(),
            api_key: api_key.to_string(),
            start_block: config.start_block,
            end_block: config.end_block,
            sort: config.sort.clone(),
            client,
        })
    }

    /// Fetch the normal transaction list of `address`.
    pub async fn txlist(&self, address: &str) -> Result<FetchOutcome, SourceError> {
        let start = self.start_block.to_string();
        let end = self.end_block.to_string();
        let params = [
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("startblock", start.as_str()),
            ("endblock", end.as_str()),
            ("sort", self.sort.as_str()),
            ("apikey", self.api_key.as_str()),
        ];

        debug!("GET {} txlist address={address}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let json: Value = resp.json().await?;
        Ok(interpret_response(json))
    }
}

/// Map an Etherscan response envelope to a [`FetchOutcome`].
pub fn interpret_response(json: Value) -> FetchOutcome {
    let status = json.get("status").and_then(Value::as_str);
    let message = json.get("message").and_then(Value::as_str);

    if status == Some("0") && message == Some(NO_TRANSACTIONS) {
        return FetchOutcome::Empty;
    }

    if message == Some("OK") {
        return match json.get("result") {
            Some(Value::Array(items)) if items.is_empty() => FetchOutcome::Empty,
            Some(Value::Array(items)) => FetchOutcome::Ok(TxRecord::from_json_array(items.clone())),
            _ => FetchOutcome::Err(json.to_string()),
        };
    }

    FetchOutcome::Err(json.to_string())
}
