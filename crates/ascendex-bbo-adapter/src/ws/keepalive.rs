/*
[INPUT]:  Session writer, heartbeat period, shared shutdown token
[OUTPUT]: Periodic WebSocket ping frames
[POS]:    WebSocket layer - keepalive loop
[UPDATE]: When changing heartbeat cadence or failure handling
*/

use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ws::session::SessionWriter;

/// Why the keepalive loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveExit {
    Cancelled,
    SendFailed,
}

/// Send a ping every `period` until a write fails or `shutdown` fires.
///
/// Cancels `shutdown` on the way out so the reader stops with it.
pub async fn run_keepalive(
    writer: SessionWriter,
    period: Duration,
    shutdown: CancellationToken,
) -> KeepAliveExit {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let exit = loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("keepalive shutdown requested");
                break KeepAliveExit::Cancelled;
            }
            _ = ticker.tick() => {
                if let Err(err) = writer.send_ping().await {
                    warn!(error = %err, "keepalive ping failed; session presumed dead");
                    break KeepAliveExit::SendFailed;
                }
                debug!("keepalive ping sent");
            }
        }
    };

    shutdown.cancel();
    info!(?exit, "keepalive loop stopped");
    exit
}
