/*
[INPUT]:  BboStream channels, optional update limit, shutdown token
[OUTPUT]: Logged updates/diagnostics and a summary of why consumption stopped
[POS]:    Consumer layer - outer drain loop of the binary
[UPDATE]: When changing how updates are surfaced or when the loop stops
*/

use ascendex_bbo_adapter::{BboStream, OrderBookUpdate, SkippedFrame};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerExit {
    /// Update channel closed; the session is gone
    StreamEnded,
    Cancelled,
    LimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub exit: ConsumerExit,
    pub updates: u64,
}

/// Receive updates in order until the stream ends, `shutdown` fires, or
/// `max_updates` have been consumed.
pub async fn drain_updates(
    stream: &mut BboStream,
    max_updates: Option<u64>,
    shutdown: &CancellationToken,
) -> DrainSummary {
    let mut updates = 0u64;
    let mut skipped_open = true;

    if max_updates == Some(0) {
        return DrainSummary {
            exit: ConsumerExit::LimitReached,
            updates,
        };
    }

    let exit = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break ConsumerExit::Cancelled,
            update = stream.updates.recv() => {
                let Some(update) = update else {
                    warn!(updates, "market stream ended");
                    break ConsumerExit::StreamEnded;
                };
                updates += 1;
                log_update(&update);
                if max_updates.is_some_and(|limit| updates >= limit) {
                    break ConsumerExit::LimitReached;
                }
            }
            skipped = stream.skipped.recv(), if skipped_open => {
                match skipped {
                    Some(skipped) => log_skipped(&skipped),
                    None => skipped_open = false,
                }
            }
        }
    };

    DrainSummary { exit, updates }
}

fn log_update(update: &OrderBookUpdate) {
    info!(
        ask_amount = update.ask.amount,
        ask_price = update.ask.price,
        bid_amount = update.bid.amount,
        bid_price = update.bid.price,
        spread = update.spread(),
        mid = update.mid_price(),
        "bbo"
    );
}

fn log_skipped(skipped: &SkippedFrame) {
    if skipped.is_error() {
        warn!(kind = skipped.kind(), reason = %skipped, "frame skipped");
    } else {
        debug!(kind = skipped.kind(), reason = %skipped, "frame skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascendex_bbo_adapter::Order;
    use tokio::sync::mpsc;

    fn update(bid_price: f64, ask_price: f64) -> OrderBookUpdate {
        OrderBookUpdate::new(Order::new(1.0, ask_price), Order::new(1.0, bid_price))
            .expect("non-crossed market")
    }

    fn stream() -> (
        mpsc::Sender<OrderBookUpdate>,
        mpsc::Sender<SkippedFrame>,
        BboStream,
    ) {
        let (updates_tx, updates) = mpsc::channel(8);
        let (skipped_tx, skipped) = mpsc::channel(8);
        (updates_tx, skipped_tx, BboStream { updates, skipped })
    }

    #[tokio::test]
    async fn test_drain_stops_when_stream_ends() {
        let (updates_tx, skipped_tx, mut stream) = stream();
        updates_tx.send(update(1.0, 2.0)).await.unwrap();
        updates_tx.send(update(2.0, 3.0)).await.unwrap();
        skipped_tx
            .send(SkippedFrame::Shape { bid_len: 1, ask_len: 2 })
            .await
            .unwrap();
        drop(updates_tx);
        drop(skipped_tx);

        let summary = drain_updates(&mut stream, None, &CancellationToken::new()).await;
        assert_eq!(summary.exit, ConsumerExit::StreamEnded);
        assert_eq!(summary.updates, 2);
    }

    #[tokio::test]
    async fn test_drain_respects_update_limit() {
        let (updates_tx, _skipped_tx, mut stream) = stream();
        for price in 1..=5 {
            updates_tx.send(update(price as f64, price as f64 + 0.5)).await.unwrap();
        }

        let summary = drain_updates(&mut stream, Some(3), &CancellationToken::new()).await;
        assert_eq!(summary.exit, ConsumerExit::LimitReached);
        assert_eq!(summary.updates, 3);

        // Remaining updates stay queued in order.
        assert_eq!(stream.updates.recv().await.unwrap().bid.price, 4.0);
    }

    #[tokio::test]
    async fn test_drain_stops_on_cancel() {
        let (_updates_tx, _skipped_tx, mut stream) = stream();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let summary = drain_updates(&mut stream, None, &shutdown).await;
        assert_eq!(summary.exit, ConsumerExit::Cancelled);
        assert_eq!(summary.updates, 0);
    }

    #[tokio::test]
    async fn test_zero_limit_returns_immediately() {
        let (_updates_tx, _skipped_tx, mut stream) = stream();
        let summary = drain_updates(&mut stream, Some(0), &CancellationToken::new()).await;
        assert_eq!(summary.exit, ConsumerExit::LimitReached);
    }
}
