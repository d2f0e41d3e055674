use serde::Deserialize;
use std::path::Path;

use crate::graph::AggregateOptions;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub graph: GraphConfig,
    pub render: RenderConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub api_url: String,
    /// Falls back to the `ETHERSCAN_API_KEY` environment variable when unset.
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub sort: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum transfer amount in ETH; smaller transfers are ignored entirely.
    pub minimum_amount: f64,
    pub focus_address: Option<String>,
    pub max_nodes: usize,
    /// Worker threads for aggregation. 1 aggregates on the calling thread.
    pub partitions: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeScale {
    Linear,
    Log,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub scale: SizeScale,
    pub min_node_size: f64,
    pub node_size_range: f64,
    pub edge_width_factor: f64,
    pub label_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub cache_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub dir: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.etherscan.io/api".into(),
            api_key: None,
            timeout_seconds: 30,
            start_block: 0,
            end_block: 99_999_999,
            sort: "asc".into(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            minimum_amount: 0.0,
            focus_address: None,
            max_nodes: 300,
            partitions: 1,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: SizeScale::Linear,
            min_node_size: 10.0,
            node_size_range: 50.0,
            edge_width_factor: 2.0,
            label_len: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/tx_cache.db".into(),
            cache_enabled: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: "out".into() }
    }
}

impl GraphConfig {
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            minimum_amount: self.minimum_amount,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Falls back to defaults if file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// API key from config, else from `ETHERSCAN_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.source
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ETHERSCAN_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}
