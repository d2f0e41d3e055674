pub mod etherscan;
pub mod file;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::TxRecord;

pub use etherscan::EtherscanClient;

/// Result of asking an upstream service for an address's transactions.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The service answered and has no transactions for the address.
    Empty,
    Ok(Vec<TxRecord>),
    /// The service reported an error; carries its raw payload.
    Err(String),
}

impl FetchOutcome {
    /// Collapse into a record list, turning a service-side error into `SourceError::Upstream`.
    pub fn into_records(self) -> Result<Vec<TxRecord>, SourceError> {
        match self {
            FetchOutcome::Empty => Ok(Vec::new()),
            FetchOutcome::Ok(records) => Ok(records),
            FetchOutcome::Err(payload) => Err(SourceError::Upstream(payload)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("missing column \"{0}\"")]
    MissingColumn(&'static str),
}

/// Two-hop demo data: A sends 0.5 to B, B forwards 0.3 to C.
pub fn sample_records() -> Vec<TxRecord> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string();

    let mut first = TxRecord::new("0xAAA", "0xBBB", "500000000000000000");
    first.hash = Some("0x1".into());
    first.timestamp = Some(now.clone());

    let mut second = TxRecord::new("0xBBB", "0xCCC", "300000000000000000");
    second.hash = Some("0x2".into());
    second.timestamp = Some(now);

    vec![first, second]
}
