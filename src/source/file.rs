use std::path::Path;

use serde_json::Value;

use super::{FetchOutcome, SourceError, etherscan::interpret_response};
use crate::core::{RawAmount, TxRecord};

/// Load records from a CSV export with a header row.
///
/// Columns are matched by name (`hash`, `from`, `to`, `value`/`Value`,
/// `timeStamp`/`timestamp`); other columns are ignored. A `value` column is
/// required. Short rows leave the missing cells absent.
pub fn load_csv(path: &Path) -> Result<Vec<TxRecord>, SourceError> {
    let content = std::fs::read_to_string(path)?;
    parse_csv(&content)
}

pub fn parse_csv(content: &str) -> Result<Vec<TxRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header = reader.headers()?.clone();
    let col = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.contains(&h.trim_start_matches('\u{feff}')))
    };

    let value_col = col(&["value", "Value"]).ok_or(SourceError::MissingColumn("value"))?;
    let hash_col = col(&["hash", "Hash"]);
    let from_col = col(&["from", "From"]);
    let to_col = col(&["to", "To"]);
    let ts_col = col(&["timeStamp", "timestamp", "TimeStamp"]);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        records.push(TxRecord {
            hash: cell(hash_col),
            from: cell(from_col),
            to: cell(to_col),
            value: cell(Some(value_col)).map(RawAmount::Text),
            timestamp: cell(ts_col),
        });
    }
    Ok(records)
}

/// Load records from JSON: a bare array of records or a full Etherscan
/// response envelope. Array elements are mapped one by one.
pub fn load_json(path: &Path) -> Result<FetchOutcome, SourceError> {
    let content = std::fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content)?;
    match json {
        Value::Array(items) if items.is_empty() => Ok(FetchOutcome::Empty),
        Value::Array(items) => Ok(FetchOutcome::Ok(TxRecord::from_json_array(items))),
        envelope => Ok(interpret_response(envelope)),
    }
}
