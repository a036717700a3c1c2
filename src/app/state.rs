//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::relay::Relay;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            relay: Arc::new(Relay::new()),
        }
    }
}
