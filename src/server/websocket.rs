//! Relay WebSocket connection handling
//!
//! Each upgraded connection registers with the `RoomHub`, then runs one loop
//! that forwards hub events out and feeds client frames into the `Relay`.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use hyper_tungstenite::HyperWebsocket;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::http::AppState;
use crate::relay::{ClientEvent, ServerEvent};

/// Upgrade `/socket` and spawn the connection task
pub fn handle_relay_upgrade<B>(state: Arc<AppState>, mut req: Request<B>) -> Response<Full<Bytes>> {
    let (response, websocket) = match hyper_tungstenite::upgrade(&mut req, None) {
        Ok(upgrade) => upgrade,
        Err(e) => {
            warn!("WebSocket upgrade failed: {}", e);
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Full::new(Bytes::from(format!("WebSocket upgrade failed: {}", e))))
                .unwrap();
        }
    };

    tokio::spawn(async move {
        if let Err(e) = handle_relay_connection(state, websocket).await {
            debug!("Relay connection ended with error: {}", e);
        }
    });

    response
}

async fn handle_relay_connection(
    state: Arc<AppState>,
    websocket: HyperWebsocket,
) -> Result<(), hyper_tungstenite::tungstenite::Error> {
    let ws = websocket.await?;
    let (mut sink, mut stream) = ws.split();
    let (conn, mut outbound) = state.hub.connect();

    info!(conn = %conn, "Relay client connected");

    loop {
        tokio::select! {
            event = outbound.recv() => match event {
                Some(event) => {
                    if sink.send(Message::Text(event.to_json())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let reply = match ClientEvent::parse(&text) {
                        Ok(event) => state.relay.handle_event(conn, event),
                        Err(e) => Some(ServerEvent::Error {
                            message: format!("Invalid event: {}", e),
                        }),
                    };
                    if let Some(reply) = reply {
                        state.hub.send_to(conn, reply);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn = %conn, "Relay read error: {}", e);
                    break;
                }
            },
        }
    }

    state.relay.disconnect(conn);
    let _ = sink.close().await;
    info!(conn = %conn, "Relay client disconnected");
    Ok(())
}
