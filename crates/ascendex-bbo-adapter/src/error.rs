/*
[INPUT]:  Error sources (configuration, connection, subscription, serialization)
[OUTPUT]: Structured error types with fatality hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Main error type for the AscendEX BBO adapter
#[derive(Error, Debug)]
pub enum BboError {
    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Session could not be established
    #[error("Failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// Subscribe frame could not be serialized or written
    #[error("Failed to subscribe to {channel}: {source}")]
    Subscribe {
        channel: String,
        #[source]
        source: Box<BboError>,
    },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to the session failed
    #[error("WebSocket send failed: {0}")]
    Send(#[source] tungstenite::Error),

    /// The session writer task has stopped
    #[error("WebSocket writer stopped")]
    WriterClosed,

    /// The outbound queue is full
    #[error("WebSocket outbound queue full")]
    WriterBusy,

    /// Operation requires an established session
    #[error("WebSocket not connected")]
    NotConnected,

    /// `connect` was called on a client that already holds a session
    #[error("WebSocket already connected")]
    AlreadyConnected,

    /// The session read half has already been handed to a reader
    #[error("Session reader already taken")]
    ReaderTaken,
}

impl BboError {
    /// Check if the error should terminate the process.
    ///
    /// Only session setup failures are fatal; everything on the data path is skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BboError::Config(_)
                | BboError::UrlParse(_)
                | BboError::Connection { .. }
                | BboError::Subscribe { .. }
        )
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, BboError>;
