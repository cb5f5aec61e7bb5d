//! Realtime chat relay
//!
//! Connections join named rooms (a room is a user id). Sending to a room
//! appends the message to that room's chat log, then fans it out to every
//! connection currently in the room. There is no buffering, no message id and
//! no retry; a peer that has gone away is simply skipped.
//!
//! Payments credit the ledger and leave a `"$<amount>"` entry in the payer's
//! chat log. The entry is broadcast live like any other chat message.
//!
//! The pub/sub layer is behind `RoomTransport`; `RoomHub` is the in-process
//! implementation used by the WebSocket endpoint.

pub mod hub;
pub mod protocol;

pub use hub::RoomHub;
pub use protocol::{ClientEvent, ServerEvent};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::store::Store;
use crate::types::{LyceumError, Result};

/// Identifier of one realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Room-based pub/sub capability
pub trait RoomTransport: Send + Sync {
    /// Add a connection to a room. Joining twice is harmless.
    fn join(&self, conn: ConnId, room: &str);

    /// Remove a connection from a room. Leaving a room not joined is a no-op.
    fn leave(&self, conn: ConnId, room: &str);

    /// Deliver `msg` to every member of `room`, returning how many accepted it
    fn broadcast(&self, room: &str, msg: &str) -> usize;

    /// Remove a connection from every room
    fn disconnect(&self, conn: ConnId);
}

/// Outcome of a payment
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub uid: String,
    pub amount: f64,
    /// Ledger balance after the payment
    pub balance: f64,
    /// Entry appended to the chat log
    pub entry: String,
}

/// Chat relay over a shared store and a room transport
pub struct Relay {
    store: Arc<Store>,
    transport: Arc<dyn RoomTransport>,
}

impl Relay {
    pub fn new(store: Arc<Store>, transport: Arc<dyn RoomTransport>) -> Self {
        Self { store, transport }
    }

    pub fn join(&self, conn: ConnId, room: &str) {
        self.transport.join(conn, room);
        debug!(conn = %conn, room = %room, "Joined room");
    }

    pub fn leave(&self, conn: ConnId, room: &str) {
        self.transport.leave(conn, room);
        debug!(conn = %conn, room = %room, "Left room");
    }

    /// Log `msg` under `room`, then broadcast it to the room's members
    pub fn send(&self, room: &str, msg: &str) -> usize {
        let len = self.store.chat.append(room, msg.to_string());
        let delivered = self.transport.broadcast(room, msg);
        debug!(room = %room, log_len = len, delivered, "Chat message relayed");
        delivered
    }

    pub fn disconnect(&self, conn: ConnId) {
        self.transport.disconnect(conn);
    }

    /// Parse `raw_amount` and pay it to `uid`
    pub fn pay(&self, uid: &str, raw_amount: &str) -> Result<Payment> {
        let amount = parse_amount(raw_amount)?;
        Ok(self.pay_amount(uid, amount))
    }

    /// Credit `amount` to `uid` and record it in the chat log
    pub fn pay_amount(&self, uid: &str, amount: f64) -> Payment {
        let balance = self.store.ledger.credit(uid, amount);
        let entry = format_payment(amount);
        self.send(uid, &entry);

        info!(uid = %uid, amount, balance, "Payment recorded");
        Payment {
            uid: uid.to_string(),
            amount,
            balance,
            entry,
        }
    }

    /// Chat transcript of a room
    pub fn history(&self, room: &str) -> Vec<String> {
        self.store.chat.entries(room)
    }

    pub fn balance(&self, uid: &str) -> f64 {
        self.store.ledger.balance(uid)
    }

    /// Apply a client event, returning a reply for the sender if any
    pub fn handle_event(&self, conn: ConnId, event: ClientEvent) -> Option<ServerEvent> {
        match event {
            ClientEvent::Join { room } => {
                self.join(conn, &room);
                None
            }
            ClientEvent::Leave { room } => {
                self.leave(conn, &room);
                None
            }
            ClientEvent::Message { uid, msg } => {
                self.send(&uid, &msg);
                None
            }
            ClientEvent::Ping => Some(ServerEvent::Pong),
        }
    }
}

/// Parse a payment amount; must be a finite number
pub fn parse_amount(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| LyceumError::TypeCoercion {
            field: "amount".to_string(),
            value: raw.to_string(),
        })
}

/// Chat log entry for a payment, e.g. `$5` or `$2.5`
pub fn format_payment(amount: f64) -> String {
    format!("${}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn relay() -> (Relay, Arc<RoomHub>, Arc<Store>) {
        let store = Arc::new(Store::default());
        let hub = Arc::new(RoomHub::new());
        let relay = Relay::new(Arc::clone(&store), hub.clone());
        (relay, hub, store)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ServerEvent::Message { msg, .. } = event {
                out.push(msg);
            }
        }
        out
    }

    #[test]
    fn test_send_logs_in_call_order() {
        let (relay, _, _) = relay();
        for msg in ["m1", "m2", "m3", "m4"] {
            relay.send("room", msg);
        }
        assert_eq!(relay.history("room"), vec!["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn test_join_send_leave() {
        let (relay, hub, _) = relay();
        let (listener, mut rx) = hub.connect();
        let (_sender, _) = hub.connect();

        relay.join(listener, "u1");
        relay.send("u1", "first");
        assert_eq!(drain(&mut rx), vec!["first"]);

        relay.leave(listener, "u1");
        relay.send("u1", "second");
        assert!(drain(&mut rx).is_empty());

        // Still logged even with nobody listening
        assert_eq!(relay.history("u1"), vec!["first", "second"]);
    }

    #[test]
    fn test_pay_accumulates() {
        let (relay, _, store) = relay();
        relay.pay("u1", "5").unwrap();
        let payment = relay.pay("u1", "3").unwrap();

        assert_eq!(payment.balance, 8.0);
        assert_eq!(store.ledger.balance("u1"), 8.0);
        assert_eq!(relay.history("u1"), vec!["$5", "$3"]);
    }

    #[test]
    fn test_pay_is_broadcast_live() {
        let (relay, hub, _) = relay();
        let (conn, mut rx) = hub.connect();
        relay.join(conn, "u1");

        relay.pay("u1", "2.5").unwrap();
        assert_eq!(drain(&mut rx), vec!["$2.5"]);
    }

    #[test]
    fn test_pay_rejects_non_numeric() {
        let (relay, _, store) = relay();
        for raw in ["ten", "", "NaN", "inf"] {
            let err = relay.pay("u1", raw).unwrap_err();
            assert!(matches!(err, LyceumError::TypeCoercion { .. }), "{raw}");
        }
        assert!(!store.ledger.contains("u1"));
        assert!(relay.history("u1").is_empty());
    }

    #[test]
    fn test_unknown_room_lookups_are_empty() {
        let (relay, _, _) = relay();
        assert!(relay.history("ghost").is_empty());
        assert_eq!(relay.balance("ghost"), 0.0);
    }

    #[test]
    fn test_handle_event() {
        let (relay, hub, _) = relay();
        let (conn, mut rx) = hub.connect();

        assert!(relay
            .handle_event(conn, ClientEvent::Join { room: "u1".into() })
            .is_none());
        relay.handle_event(
            conn,
            ClientEvent::Message {
                uid: "u1".into(),
                msg: "hi".into(),
            },
        );
        assert_eq!(drain(&mut rx), vec!["hi"]);
        assert_eq!(
            relay.handle_event(conn, ClientEvent::Ping),
            Some(ServerEvent::Pong)
        );
    }

    #[test]
    fn test_format_payment() {
        assert_eq!(format_payment(5.0), "$5");
        assert_eq!(format_payment(2.5), "$2.5");
        assert_eq!(parse_amount(" 7 ").unwrap(), 7.0);
    }
}
