//! Event channel transports
//!
//! The push channel delivers named events as length-prefixed JSON
//! frames: `[u16 name length][name bytes][u32 payload length][payload]`.
//! The client writes a single handshake frame carrying the bearer token
//! at connect time and only reads after that.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};

use crate::realtime::RealtimeError;

/// Handshake frame name, sent by the client once per connection.
pub const HANDSHAKE_EVENT: &str = "handshake";

/// Upper bound for a single frame payload.
const MAX_PAYLOAD_BYTES: u32 = 1024 * 1024;

/// A named event frame as read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

/// Transport abstraction for the push channel.
#[async_trait]
pub trait EventChannel: Send + Sync + std::fmt::Debug {
    /// Next pushed frame. [`RealtimeError::Closed`] once the channel is
    /// gone.
    async fn next_event(&self) -> Result<RawEvent, RealtimeError>;

    /// Close the channel. Closing an already-closed channel is a no-op.
    async fn close(&self) -> Result<(), RealtimeError>;
}

// ============================================================================
// TCP Transport
// ============================================================================

/// Long-lived TCP event stream.
#[derive(Debug, Clone)]
pub struct TcpChannel {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpChannel {
    /// Connect and authenticate with a bearer token.
    pub async fn connect(addr: &str, token: &str) -> Result<Self, RealtimeError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();

        let channel = Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        };

        channel
            .write_frame(HANDSHAKE_EVENT, &serde_json::json!({ "token": token }))
            .await?;

        Ok(channel)
    }

    async fn write_frame(
        &self,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), RealtimeError> {
        let name = event.as_bytes();
        let body = serde_json::to_vec(payload)?;

        let mut writer = self.writer.lock().await;
        writer.write_all(&(name.len() as u16).to_be_bytes()).await?;
        writer.write_all(name).await?;
        writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_frame(&self) -> Result<RawEvent, RealtimeError> {
        let mut reader = self.reader.lock().await;

        let mut name_len = [0u8; 2];
        reader.read_exact(&mut name_len).await?;
        let mut name = vec![0u8; u16::from_be_bytes(name_len) as usize];
        reader.read_exact(&mut name).await?;

        let mut payload_len = [0u8; 4];
        reader.read_exact(&mut payload_len).await?;
        let payload_len = u32::from_be_bytes(payload_len);
        if payload_len > MAX_PAYLOAD_BYTES {
            return Err(RealtimeError::InvalidFrame(format!(
                "payload of {} bytes exceeds limit",
                payload_len
            )));
        }
        let mut payload = vec![0u8; payload_len as usize];
        reader.read_exact(&mut payload).await?;

        let event = String::from_utf8(name)
            .map_err(|_| RealtimeError::InvalidFrame("non-utf8 event name".to_string()))?;
        let payload = serde_json::from_slice(&payload)?;

        Ok(RawEvent { event, payload })
    }
}

#[async_trait]
impl EventChannel for TcpChannel {
    async fn next_event(&self) -> Result<RawEvent, RealtimeError> {
        self.read_frame().await.map_err(|err| match err {
            // EOF means the server went away; report as closed
            RealtimeError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                RealtimeError::Closed
            }
            other => other,
        })
    }

    async fn close(&self) -> Result<(), RealtimeError> {
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
        Ok(())
    }
}

// ============================================================================
// Memory Transport
// ============================================================================

/// In-process channel for tests and previews. The paired sender pushes
/// frames directly into the receiver.
#[derive(Debug)]
pub struct MemoryChannel {
    rx: Mutex<mpsc::UnboundedReceiver<RawEvent>>,
    closed: AtomicBool,
}

impl MemoryChannel {
    /// Create a connected (sender, channel) pair.
    pub fn pair() -> (mpsc::UnboundedSender<RawEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx: Mutex::new(rx),
                closed: AtomicBool::new(false),
            },
        )
    }
}

#[async_trait]
impl EventChannel for MemoryChannel {
    async fn next_event(&self) -> Result<RawEvent, RealtimeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::Closed);
        }
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(RealtimeError::Closed)
    }

    async fn close(&self) -> Result<(), RealtimeError> {
        // flag only: a reader parked in `next_event` holds the rx lock,
        // and the manager aborts it right after closing
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
