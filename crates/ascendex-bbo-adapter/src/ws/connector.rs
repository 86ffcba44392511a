/*
[INPUT]:  StreamConfig (endpoint URL and frame limits)
[OUTPUT]: Established Session or BboError::Connection
[POS]:    WebSocket layer - session establishment
[UPDATE]: When changing handshake headers or transport limits
*/

use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::CONTENT_TYPE;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, info};

use crate::config::StreamConfig;

/// Transport-level ceiling. The configured frame cap is enforced by the reader
/// instead, because a capacity error ends the tokio-tungstenite stream.
const TRANSPORT_MAX_MESSAGE_SIZE: usize = 64 << 20;
use crate::error::{BboError, Result};
use crate::ws::session::Session;

/// Open the session with a single attempt. No retry.
pub async fn connect(config: &StreamConfig) -> Result<Session> {
    config.validate()?;
    let url = config.endpoint_url()?;

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|source| BboError::Connection {
            url: url.to_string(),
            source,
        })?;
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let transport_limit = TRANSPORT_MAX_MESSAGE_SIZE.max(config.max_frame_size);
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(transport_limit))
        .max_frame_size(Some(transport_limit));

    debug!(url = %url, max_frame_size = config.max_frame_size, "connecting to market stream");
    let (stream, response) = connect_async_with_config(request, Some(ws_config), false)
        .await
        .map_err(|source| BboError::Connection {
            url: url.to_string(),
            source,
        })?;

    info!(url = %url, status = %response.status(), "market stream connected");
    Ok(Session::new(stream))
}
