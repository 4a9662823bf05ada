//! A `tokio-tungstenite` WebSocket [`HubTransport`].
//!
//! Opens one connection, serializes every [`OutgoingFrame`] as a JSON text
//! message on send, and decodes every inbound text message into an
//! [`IncomingFrame`] on a background task, handed to the caller over an
//! unbounded channel rather than threaded through [`HubLink`] directly —
//! this crate has no opinion on what runs the event loop that calls
//! `HubLink::handle_incoming`/`handle_disconnect`; that's the caller's job,
//! same as the design's "a callback for `onFrame`" leaves dispatch to
//! whatever owns the connection.
//!
//! ```no_run
//! # async fn example() -> Result<(), flo_hub::HubError> {
//! use flo_hub::{HubLink};
//! use flo_hub::ws::WebSocketTransport;
//! use std::sync::Arc;
//!
//! let (transport, mut incoming) = WebSocketTransport::connect("wss://hub.example.com/ws").await?;
//! let link = Arc::new(HubLink::new(transport));
//! tokio::spawn({
//!     let link = link.clone();
//!     async move {
//!         while let Some(frame) = incoming.recv().await {
//!             link.handle_incoming(frame);
//!         }
//!         link.handle_disconnect();
//!     }
//! });
//! # Ok(())
//! # }
//! ```

use crate::error::HubError;
use crate::frame::{IncomingFrame, OutgoingFrame};
use crate::link::HubTransport;
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// A [`HubTransport`] backed by one `tokio-tungstenite` WebSocket connection.
pub struct WebSocketTransport {
    sink: Mutex<WsSink>,
}

impl WebSocketTransport {
    /// Connect to `url` and spawn a background task that decodes every
    /// inbound text frame into an [`IncomingFrame`] and forwards it on the
    /// returned channel. The channel closes (`recv` returns `None`) when the
    /// socket closes or a read error occurs — exactly the signal the caller
    /// needs to run `HubLink::handle_disconnect`.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<IncomingFrame>), HubError> {
        let (stream, _response) = connect_async(url).await.map_err(|e| HubError::Connection(e.to_string()))?;
        let (sink, mut source) = stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<IncomingFrame>(&text.to_string()) {
                        Ok(frame) => {
                            if tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(err) => tracing::warn!(error = %err, "malformed hub frame, dropping"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "hub websocket read error");
                        break;
                    }
                }
            }
            // Dropping `tx` here closes the channel; the caller's feed loop
            // observes `recv() -> None` and runs `handle_disconnect`.
        });

        Ok((Self { sink: Mutex::new(sink) }, rx))
    }
}

#[async_trait]
impl HubTransport for WebSocketTransport {
    async fn send(&self, frame: OutgoingFrame) -> Result<(), HubError> {
        let text = serde_json::to_string(&frame).map_err(|e| HubError::Protocol(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::text(text))
            .await
            .map_err(|e| HubError::Connection(e.to_string()))
    }
}
