/*
[INPUT]:  StreamConfig and the symbol to follow
[OUTPUT]: Running keepalive + reader tasks and the consumer-side channels
[POS]:    WebSocket layer - client lifecycle facade
[UPDATE]: When changing the connect/subscribe/run sequence or shutdown semantics
*/

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::error::{BboError, Result};
use crate::types::OrderBookUpdate;
use crate::ws::connector;
use crate::ws::keepalive::run_keepalive;
use crate::ws::reader::{MessageReader, SkippedFrame};
use crate::ws::session::Session;
use crate::ws::subscriber;

/// Consumer side of a running BBO session.
///
/// `updates` closes when the session ends. `skipped` carries diagnostics for
/// frames that produced no update and may be ignored.
#[derive(Debug)]
pub struct BboStream {
    pub updates: mpsc::Receiver<OrderBookUpdate>,
    pub skipped: mpsc::Receiver<SkippedFrame>,
}

/// Streaming client for the AscendEX BBO channel.
///
/// One client owns one session. There is no reconnection: once either loop
/// stops, both stop and `updates` closes.
#[derive(Debug)]
pub struct AscendexBboClient {
    config: StreamConfig,
    session: Option<Session>,
    symbol: Option<String>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl AscendexBboClient {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            session: None,
            symbol: None,
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Token cancelled when either loop stops or on `disconnect`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some() && !self.shutdown.is_cancelled()
    }

    /// Establish the session. Fails if already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(BboError::AlreadyConnected);
        }
        let session = connector::connect(&self.config).await?;
        self.shutdown = CancellationToken::new();
        self.session = Some(session);
        Ok(())
    }

    pub async fn subscribe(&mut self, symbol: &str) -> Result<()> {
        let writer = self.session()?.writer();
        subscriber::subscribe(&writer, symbol).await?;
        self.symbol = Some(symbol.to_string());
        Ok(())
    }

    /// Spawn the keepalive loop on the current runtime.
    pub fn start_keepalive(&mut self) -> Result<()> {
        let writer = self.session()?.writer();
        let period = self.config.ping_period();
        let shutdown = self.shutdown.clone();

        debug!(?period, "starting keepalive loop");
        self.tasks.push(tokio::spawn(async move {
            run_keepalive(writer, period, shutdown).await;
        }));
        Ok(())
    }

    /// Spawn the reader loop feeding `updates`. Returns the skipped-frame receiver.
    pub fn start_reader(
        &mut self,
        updates: mpsc::Sender<OrderBookUpdate>,
    ) -> Result<mpsc::Receiver<SkippedFrame>> {
        let idle_timeout = self.config.idle_timeout;
        let max_frame_size = self.config.max_frame_size;
        let (skipped_tx, skipped_rx) = mpsc::channel(self.config.skipped_buffer);
        let shutdown = self.shutdown.clone();

        let session = self.session_mut()?;
        let writer = session.writer();
        let reader = session.take_reader()?;

        let reader = MessageReader::new(
            reader,
            writer,
            idle_timeout,
            max_frame_size,
            updates,
            skipped_tx,
            shutdown,
        );
        debug!(?idle_timeout, "starting reader loop");
        self.tasks.push(tokio::spawn(async move {
            reader.run().await;
        }));
        Ok(skipped_rx)
    }

    /// Connect, subscribe, and start both loops.
    pub async fn stream(&mut self, symbol: &str) -> Result<BboStream> {
        self.connect().await?;
        self.subscribe(symbol).await?;
        self.start_keepalive()?;

        let (updates_tx, updates) = mpsc::channel(self.config.update_buffer);
        let skipped = self.start_reader(updates_tx)?;

        info!(symbol, endpoint = %self.config.endpoint, "bbo stream started");
        Ok(BboStream { updates, skipped })
    }

    /// Stop both loops and close the session. Safe to call more than once.
    pub async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let writer = session.writer();

        if let Some(symbol) = self.symbol.take()
            && !self.shutdown.is_cancelled()
            && let Err(err) = subscriber::unsubscribe(&writer, &symbol).await
        {
            debug!(%symbol, error = %err, "unsubscribe on disconnect failed");
        }

        self.shutdown.cancel();
        writer.close().await;

        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                debug!(error = %err, "session task join failed");
            }
        }
        info!("market stream disconnected");
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(BboError::NotConnected)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(BboError::NotConnected)
    }
}

impl Drop for AscendexBboClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
