//! In-process room hub
//!
//! Implements `RoomTransport` with one unbounded channel per connection. The
//! WebSocket task owning the connection drains its channel into the socket.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

use super::protocol::ServerEvent;
use super::{ConnId, RoomTransport};

/// Room membership and per-connection outbound channels
pub struct RoomHub {
    next_id: AtomicU64,
    /// Outbound channel per live connection
    peers: DashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
    /// Members per room
    rooms: DashMap<String, HashSet<ConnId>>,
    /// Rooms per connection, for implicit leave on disconnect
    memberships: DashMap<ConnId, HashSet<String>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            peers: DashMap::new(),
            rooms: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Register a connection and hand back the receiving end of its channel
    pub fn connect(&self) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ConnId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(id, tx);
        debug!(conn = %id, peers = self.peers.len(), "Relay connection registered");
        (id, rx)
    }

    /// Push an event to a single connection
    pub fn send_to(&self, conn: ConnId, event: ServerEvent) -> bool {
        self.peers
            .get(&conn)
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Current members of a room
    pub fn members(&self, room: &str) -> Vec<ConnId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomTransport for RoomHub {
    fn join(&self, conn: ConnId, room: &str) {
        self.rooms.entry(room.to_string()).or_default().insert(conn);
        self.memberships
            .entry(conn)
            .or_default()
            .insert(room.to_string());
    }

    fn leave(&self, conn: ConnId, room: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());

        if let Some(mut rooms) = self.memberships.get_mut(&conn) {
            rooms.remove(room);
        }
    }

    fn broadcast(&self, room: &str, msg: &str) -> usize {
        let mut delivered = 0;
        for conn in self.members(room) {
            let event = ServerEvent::Message {
                room: room.to_string(),
                msg: msg.to_string(),
            };
            if self.send_to(conn, event) {
                delivered += 1;
            }
        }
        delivered
    }

    fn disconnect(&self, conn: ConnId) {
        if let Some((_, rooms)) = self.memberships.remove(&conn) {
            for room in rooms {
                if let Some(mut members) = self.rooms.get_mut(&room) {
                    members.remove(&conn);
                }
                self.rooms.remove_if(&room, |_, members| members.is_empty());
            }
        }
        self.peers.remove(&conn);
        debug!(conn = %conn, peers = self.peers.len(), "Relay connection dropped");
    }
}
