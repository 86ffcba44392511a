/*
[INPUT]:  Raw WebSocket text frames and outbound control requests
[OUTPUT]: WireMessage decode targets and serializable requests
[POS]:    WebSocket layer - message schema
[UPDATE]: When adding new message types or changing format
*/

use serde::{Deserialize, Serialize};

pub const OP_SUBSCRIBE: &str = "sub";
pub const OP_UNSUBSCRIBE: &str = "unsub";
pub const OP_PONG: &str = "pong";
/// Message type of the server's application-level heartbeat
pub const MESSAGE_TYPE_PING: &str = "ping";

/// Inbound frame on the BBO channel.
///
/// Missing fields decode to their defaults, so control frames such as the
/// subscription ack decode successfully and fail the shape check instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WireMessage {
    #[serde(rename = "m")]
    pub message_type: String,
    pub symbol: String,
    pub data: BboData,
}

/// Payload of a BBO frame; `bid` and `ask` are `[amount, price]` decimal strings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BboData {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub bid: Vec<String>,
    pub ask: Vec<String>,
}

impl WireMessage {
    pub fn is_heartbeat(&self) -> bool {
        self.message_type == MESSAGE_TYPE_PING
    }
}

/// Outbound control request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch: Option<String>,
}

impl SubscribeRequest {
    pub fn subscribe_bbo(symbol: &str) -> Self {
        Self {
            op: OP_SUBSCRIBE,
            ch: Some(bbo_channel(symbol)),
        }
    }

    pub fn unsubscribe_bbo(symbol: &str) -> Self {
        Self {
            op: OP_UNSUBSCRIBE,
            ch: Some(bbo_channel(symbol)),
        }
    }

    /// Reply to the server's `{"m":"ping"}` heartbeat
    pub fn pong() -> Self {
        Self { op: OP_PONG, ch: None }
    }

    pub fn channel(&self) -> Option<&str> {
        self.ch.as_deref()
    }
}

/// Channel name for a symbol; the symbol is used verbatim.
pub fn bbo_channel(symbol: &str) -> String {
    format!("bbo:{symbol}")
}
