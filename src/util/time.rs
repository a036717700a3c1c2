//! Time utilities for the simulation and the server

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate of the local movement simulation
pub const SIMULATION_TPS: u32 = 60;

/// Length of one simulation tick
pub fn tick_duration() -> Duration {
    Duration::from_secs(1) / SIMULATION_TPS
}
