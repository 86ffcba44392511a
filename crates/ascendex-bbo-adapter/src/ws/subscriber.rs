/*
[INPUT]:  Session writer and a caller-provided symbol
[OUTPUT]: One subscribe (or unsubscribe) text frame on the wire
[POS]:    WebSocket layer - channel subscription
[UPDATE]: When adding channels or changing the request format
*/

use tracing::info;

use crate::error::{BboError, Result};
use crate::ws::message::SubscribeRequest;
use crate::ws::session::SessionWriter;

/// Subscribe to the BBO channel. Fire-and-forget: the server ack is not awaited.
pub async fn subscribe(writer: &SessionWriter, symbol: &str) -> Result<()> {
    let request = SubscribeRequest::subscribe_bbo(symbol);
    send_request(writer, &request).await?;
    info!(channel = request.channel().unwrap_or_default(), "ws subscription sent");
    Ok(())
}

pub async fn unsubscribe(writer: &SessionWriter, symbol: &str) -> Result<()> {
    let request = SubscribeRequest::unsubscribe_bbo(symbol);
    send_request(writer, &request).await?;
    info!(channel = request.channel().unwrap_or_default(), "ws unsubscription sent");
    Ok(())
}

async fn send_request(writer: &SessionWriter, request: &SubscribeRequest) -> Result<()> {
    writer
        .send_json(request)
        .await
        .map_err(|source| BboError::Subscribe {
            channel: request.channel().unwrap_or_default().to_string(),
            source: Box::new(source),
        })
}
