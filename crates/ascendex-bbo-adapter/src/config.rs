/*
[INPUT]:  Endpoint URL, idle timeout, frame limits, channel sizes
[OUTPUT]: Validated StreamConfig used by connector and loops
[POS]:    Configuration layer - session tuning
[UPDATE]: When adding connection options or changing defaults
*/

use std::time::Duration;
use url::Url;

use crate::error::{BboError, Result};

/// Public AscendEX streaming endpoint
pub const DEFAULT_ENDPOINT: &str = "wss://ascendex.com/1/api/pro/v1/stream";
/// Server closes sessions idle for longer than this
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;
const DEFAULT_UPDATE_BUFFER: usize = 1;
const DEFAULT_SKIPPED_BUFFER: usize = 64;

/// Session configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: String,
    pub idle_timeout: Duration,
    pub max_frame_size: usize,
    /// Capacity of the update channel; 1 keeps a single in-flight handoff
    pub update_buffer: usize,
    pub skipped_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            update_buffer: DEFAULT_UPDATE_BUFFER,
            skipped_buffer: DEFAULT_SKIPPED_BUFFER,
        }
    }
}

impl StreamConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Heartbeat period: nine tenths of the idle window.
    pub fn ping_period(&self) -> Duration {
        self.idle_timeout * 9 / 10
    }

    /// Parse and check the endpoint, returning it as a URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(BboError::Config(format!(
                "endpoint scheme must be ws or wss, got {other}"
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.ping_period().is_zero() {
            return Err(BboError::Config("idle_timeout too small for a ping period".to_string()));
        }
        if self.max_frame_size == 0 {
            return Err(BboError::Config("max_frame_size must be non-zero".to_string()));
        }
        if self.update_buffer == 0 || self.skipped_buffer == 0 {
            return Err(BboError::Config("channel buffers must be non-zero".to_string()));
        }
        Ok(())
    }
}
