//! Realtime sync client
//!
//! Maintains at most one push channel per authenticated session and
//! translates server-pushed domain events into [`SyncSignal`]s for the
//! refresh driver and the UI. The connection handle is owned by a
//! session-scoped, injectable [`RealtimeManager`], so tests can
//! substitute an in-memory channel.

pub mod transport;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::sync::SyncSignal;
use shared::ServerEvent;

pub use transport::{EventChannel, MemoryChannel, RawEvent, TcpChannel};

/// Capacity of the signal fan-out; stale subscribers lag rather than
/// block the read loop.
const SIGNAL_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel closed")]
    Closed,
}

struct Connection {
    token: String,
    channel: Arc<dyn EventChannel>,
    signals: broadcast::Sender<SyncSignal>,
    reader: tokio::task::JoinHandle<()>,
}

/// Session-scoped owner of the single push channel.
#[derive(Default)]
pub struct RealtimeManager {
    connection: Option<Connection>,
}

impl RealtimeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect lazily: while a connection is live, the dialer is not
    /// invoked and a subscription to the existing channel is returned.
    ///
    /// # Errors
    ///
    /// Whatever the dialer reports; the manager stays disconnected.
    pub async fn connect<C, F, Fut>(
        &mut self,
        token: &str,
        dial: F,
    ) -> Result<broadcast::Receiver<SyncSignal>, RealtimeError>
    where
        C: EventChannel + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, RealtimeError>>,
    {
        if let Some(conn) = &self.connection {
            if conn.token != token {
                tracing::warn!("reusing live realtime channel under a different session token");
            }
            return Ok(conn.signals.subscribe());
        }

        let channel: Arc<dyn EventChannel> = Arc::new(dial().await?);
        let (signals, receiver) = broadcast::channel(SIGNAL_BUFFER);

        let reader = tokio::spawn(read_loop(channel.clone(), signals.clone()));

        self.connection = Some(Connection {
            token: token.to_string(),
            channel,
            signals,
            reader,
        });

        Ok(receiver)
    }

    /// Connect over TCP with the session's bearer token.
    pub async fn connect_tcp(
        &mut self,
        addr: &str,
        token: &str,
    ) -> Result<broadcast::Receiver<SyncSignal>, RealtimeError> {
        let addr = addr.to_string();
        let tok = token.to_string();
        self.connect(token, move || async move { TcpChannel::connect(&addr, &tok).await })
            .await
    }

    /// Subscribe to the live connection's signals.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<SyncSignal>> {
        self.connection.as_ref().map(|conn| conn.signals.subscribe())
    }

    /// Close the channel and clear the handle so the next session
    /// connects fresh. Disconnecting while not connected is a no-op.
    pub async fn disconnect(&mut self) {
        let Some(conn) = self.connection.take() else {
            return;
        };

        if let Err(err) = conn.channel.close().await {
            tracing::debug!(%err, "error closing realtime channel");
        }
        conn.reader.abort();
        tracing::debug!("realtime channel closed");
    }
}

/// Reads frames until the channel dies, republishing them as signals.
async fn read_loop(channel: Arc<dyn EventChannel>, signals: broadcast::Sender<SyncSignal>) {
    loop {
        let raw = match channel.next_event().await {
            Ok(raw) => raw,
            Err(RealtimeError::Closed) => break,
            Err(err) => {
                tracing::warn!(%err, "realtime channel failed");
                break;
            }
        };

        match ServerEvent::parse(&raw.event, raw.payload) {
            Ok(event) => {
                if let Some(signal) = SyncSignal::from_event(event) {
                    // send fails only with no subscribers; that is fine
                    let _ = signals.send(signal);
                }
            }
            Err(err) => tracing::debug!(%err, "dropping unrecognized event"),
        }
    }
}
