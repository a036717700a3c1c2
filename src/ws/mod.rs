//! WebSocket surface: wire protocol and the relay connection handler

pub mod handler;
pub mod protocol;

pub use protocol::{ClientMsg, PeerInfo, PlayerId, ProtocolError, ServerMsg, WireVec3};
