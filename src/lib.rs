//! Lyceum - knowledge base, exam and realtime chat server
//!
//! Serves a topic taxonomy with research notes, a five-question
//! self-graded exam, and per-user chat rooms with a payment ledger
//! pushed live over WebSocket.

pub mod config;
pub mod content;
pub mod logging;
pub mod quiz;
pub mod relay;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LyceumError, Result};
