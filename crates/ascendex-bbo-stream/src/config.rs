/*
[INPUT]:  YAML configuration file and CLI overrides
[OUTPUT]: Parsed streamer configuration and adapter StreamConfig
[POS]:    Configuration layer - process setup
[UPDATE]: When adding new configuration options
*/

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use ascendex_bbo_adapter::StreamConfig;
use ascendex_bbo_adapter::config::{DEFAULT_ENDPOINT, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FRAME_SIZE};

/// Top-level configuration for the BBO streamer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamerConfig {
    /// Trading pair, passed to the exchange verbatim (e.g., "BTC/USDT")
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Streaming endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Server idle window; pings go out at nine tenths of it
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Optional file logging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files; stdout only when unset
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            endpoint: default_endpoint(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_frame_bytes: default_max_frame_bytes(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_symbol() -> String {
    "BTC/USDT".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

fn default_file_prefix() -> String {
    "ascendex-bbo.log".to_string()
}

impl StreamerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply CLI overrides on top of file values
    pub fn with_overrides(mut self, symbol: Option<String>, endpoint: Option<String>) -> Self {
        if let Some(symbol) = symbol {
            self.symbol = symbol;
        }
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            endpoint: self.endpoint.clone(),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            max_frame_size: self.max_frame_bytes,
            ..StreamConfig::default()
        }
    }

    /// Validate everything the adapter will check at connect time
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }
        self.stream_config().validate()?;
        Ok(())
    }
}
