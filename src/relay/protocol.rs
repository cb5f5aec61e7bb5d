//! Relay wire protocol
//!
//! JSON text frames over the `/socket` WebSocket, tagged by `event`:
//!
//! ```json
//! // client -> server
//! {"event": "join", "room": "u1"}
//! {"event": "leave", "room": "u1"}
//! {"event": "message", "uid": "u1", "msg": "hello"}
//! {"event": "ping"}
//!
//! // server -> client
//! {"event": "message", "room": "u1", "msg": "hello"}
//! {"event": "pong"}
//! {"event": "error", "message": "..."}
//! ```

use serde::{Deserialize, Serialize};

/// Event sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Join { room: String },
    Leave { room: String },
    /// Chat message for room `uid`
    Message { uid: String, msg: String },
    Ping,
}

/// Event pushed to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    Message { room: String, msg: String },
    Pong,
    Error { message: String },
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ServerEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"error","message":"serialization failed"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_events() {
        assert_eq!(
            ClientEvent::parse(r#"{"event":"join","room":"u1"}"#).unwrap(),
            ClientEvent::Join { room: "u1".into() }
        );
        assert_eq!(
            ClientEvent::parse(r#"{"event":"message","uid":"u1","msg":"hi"}"#).unwrap(),
            ClientEvent::Message {
                uid: "u1".into(),
                msg: "hi".into()
            }
        );
        assert_eq!(
            ClientEvent::parse(r#"{"event":"ping"}"#).unwrap(),
            ClientEvent::Ping
        );
    }

    #[test]
    fn test_message_without_msg_is_rejected() {
        assert!(ClientEvent::parse(r#"{"event":"message","uid":"u1"}"#).is_err());
        assert!(ClientEvent::parse(r#"{"event":"shout"}"#).is_err());
    }

    #[test]
    fn test_server_event_json() {
        let event = ServerEvent::Message {
            room: "u1".into(),
            msg: "$5".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["event"], "message");
        assert_eq!(value["room"], "u1");
        assert_eq!(value["msg"], "$5");
        assert_eq!(ServerEvent::Pong.to_json(), r#"{"event":"pong"}"#);
    }
}
