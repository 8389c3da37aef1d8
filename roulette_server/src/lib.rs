//! Live roulette server: HTTP and WebSocket gateway in front of the table actor.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
