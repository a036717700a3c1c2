//! Client transport to the relay
//!
//! The simulation never awaits the network. Outbound frames are pushed onto
//! a channel that a writer task drains; inbound text frames are queued by a
//! reader task and pulled out with `try_recv` at tick boundaries.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::ws::protocol::{ClientMsg, ProtocolError};

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Transport is closed")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Non-blocking message pipe used by the sync client
pub trait Transport {
    /// True while frames can still be sent
    fn is_open(&self) -> bool;

    /// Queue one message for sending
    fn send(&mut self, msg: &ClientMsg) -> Result<(), TransportError>;

    /// Next received text frame, if one is queued
    fn try_recv(&mut self) -> Option<String>;
}

/// WebSocket transport backed by two tokio tasks
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsTransport {
    /// Connect to a relay, e.g. `ws://127.0.0.1:3000/ws`
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, _response) = connect_async(url).await?;
        info!(url = %url, "Connected to relay");

        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<String>();
        let open = Arc::new(AtomicBool::new(true));

        let writer_open = open.clone();
        let writer = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(error = %e, "Relay send failed");
                    break;
                }
            }
            writer_open.store(false, Ordering::Release);
            let _ = sink.close().await;
        });

        let reader_open = open.clone();
        let reader = tokio::spawn(async move {
            while let Some(result) = source.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Relay connection error");
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::Release);
        });

        Ok(Self {
            outbound,
            inbound,
            open,
            reader,
            writer,
        })
    }
}

impl Transport for WsTransport {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn send(&mut self, msg: &ClientMsg) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let text = msg.encode()?;
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }

    fn try_recv(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_refused_is_reported() {
        // Port 1 is reserved and never listening in test environments
        let result = tokio_test::block_on(WsTransport::connect("ws://127.0.0.1:1/ws"));
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let result = tokio_test::block_on(WsTransport::connect("not a url"));
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
