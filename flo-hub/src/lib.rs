#![deny(missing_docs)]
//! The Hub Link: federates tool execution, persistence, and agent proxying
//! with an external host over a framed JSON channel.
//!
//! [`link::HubLink`] consumes anything that implements [`link::HubTransport`]
//! (`send(frame)`) and is fed incoming frames through
//! [`link::HubLink::handle_incoming`] (the "callback for `onFrame`" the
//! design calls for) — it has no opinion on what carries the bytes.
//! [`ws::WebSocketTransport`] is the concrete `tokio-tungstenite` transport
//! for a real deployment; tests and embedders needing a different carrier
//! can implement [`link::HubTransport`] directly instead.

pub mod error;
pub mod frame;
pub mod link;
pub mod ws;

pub use error::HubError;
pub use frame::{HubToolSpec, IncomingFrame, OutgoingFrame};
pub use link::{HubLink, HubTransport};
pub use ws::WebSocketTransport;
