//! Grapple City - grapple-swing movement core and multiplayer relay
//!
//! The library holds both halves of the game:
//! - `world`, `game`: the deterministic local movement simulation
//! - `net`, `render`: client-side sync with the relay and puppet presentation
//! - `relay`, `ws`, `http`, `app`: the WebSocket relay server

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod net;
pub mod relay;
pub mod render;
pub mod util;
pub mod world;
pub mod ws;
