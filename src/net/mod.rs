//! Relay synchronization for the game client

pub mod client;
pub mod transport;

pub use client::{ChatLine, RemotePlayer, SyncClient, CHAT_LOG_CAPACITY};
pub use transport::{Transport, TransportError, WsTransport};
