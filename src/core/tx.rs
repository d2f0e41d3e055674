use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A transfer record as delivered by a transaction source.
///
/// Every field is optional: sources hand over whatever they got and the
/// aggregator decides what is usable. Fields of an unexpected JSON type
/// deserialize to `None` instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub value: Option<RawAmount>,
    #[serde(default, rename = "timeStamp", alias = "timestamp", deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
}

/// String or number as text; anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// String or number as an amount; anything else is absent.
fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RawAmount>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(RawAmount::Text(s)),
        Value::Number(n) => Some(RawAmount::Number(n)),
        _ => None,
    })
}

/// Amount in base units, as text or as a bare JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(s: String) -> Self {
        RawAmount::Text(s)
    }
}

impl std::fmt::Display for RawAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAmount::Text(s) => f.write_str(s),
            RawAmount::Number(n) => write!(f, "{n}"),
        }
    }
}

impl TxRecord {
    pub fn new(from: &str, to: &str, value: &str) -> Self {
        Self {
            hash: None,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(RawAmount::from(value)),
            timestamp: None,
        }
    }

    /// Sender and receiver, if both are present and non-empty.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        let from = self.from.as_deref().filter(|s| !s.is_empty())?;
        let to = self.to.as_deref().filter(|s| !s.is_empty())?;
        Some((from, to))
    }

    /// Map a JSON array element to a record. Elements that are not objects
    /// become an empty record, which the aggregator skips.
    pub fn from_json(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Map every element of a JSON array on its own, so one odd element
    /// cannot reject the batch.
    pub fn from_json_array(values: Vec<Value>) -> Vec<Self> {
        values.into_iter().map(Self::from_json).collect()
    }

    /// Timestamp interpreted as unix seconds. Display only.
    pub fn seen_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.timestamp.as_deref()?.trim().parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}
