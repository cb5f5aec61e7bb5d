//! Server module
//!
//! HTTP routing plus the realtime relay WebSocket.

pub mod http;
pub mod websocket;

pub use http::{handle_request, run, serve, AppState};
